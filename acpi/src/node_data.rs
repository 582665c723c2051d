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

use std::rc::Rc;

use anyhow::{anyhow, Result};

use crate::error::AmlError;

/// The encoded width an integer was read with. Display-only; arithmetic
/// treats every integer as 64-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerWidth {
    Byte,
    Word,
    DWord,
    QWord,
}

/// A decoded AML data value.
///
/// Integers are sign-extended from their source width. Buffers are
/// reference-counted so buffer-field nodes can share them with the value
/// that owns the bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AmlData {
    #[default]
    None,
    Integer {
        value: i64,
        width: IntegerWidth,
    },
    String(String),
    Buffer(Rc<Vec<u8>>),
    Package(Vec<AmlData>),
}

impl AmlData {
    pub fn type_name(&self) -> &'static str {
        match self {
            AmlData::None => "None",
            AmlData::Integer { .. } => "Integer",
            AmlData::String(_) => "String",
            AmlData::Buffer(_) => "Buffer",
            AmlData::Package(_) => "Package",
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            AmlData::Integer { value, .. } => Ok(*value),
            other => Err(anyhow!(AmlError::TypeMismatch {
                expected: "Integer",
                found: other.type_name(),
            })),
        }
    }

    pub fn as_buffer(&self) -> Result<Rc<Vec<u8>>> {
        match self {
            AmlData::Buffer(buffer) => Ok(Rc::clone(buffer)),
            other => Err(anyhow!(AmlError::TypeMismatch {
                expected: "Buffer",
                found: other.type_name(),
            })),
        }
    }
}
