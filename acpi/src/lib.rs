// Copyright (c) 2025 The AmlDump Authors. All rights reserved.
//
// AmlDump is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

pub mod acpi_table;
pub mod aml_reader;
pub mod error;
pub mod interpreter;
pub mod name_string;
pub mod namespace;
pub mod node_data;

pub use acpi_table::{Table, TableHeader, TABLE_HEADER_SIZE};
pub use aml_reader::AmlReader;
pub use error::AmlError;
pub use interpreter::{Interpreter, ParseFrame};
pub use name_string::{NameSeg, NameString, PathKind};
pub use namespace::{Node, NodeKind, NodeRef};
pub use node_data::{AmlData, IntegerWidth};

use anyhow::Result;

/// Decode one AML table blob (a DSDT or SSDT) into its namespace tree.
pub fn interpret(data: &[u8]) -> Result<Table> {
    Interpreter::new().interpret(data)
}
