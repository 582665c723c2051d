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

use std::io::{self, Write};

use anyhow::Result;

use crate::aml_reader::AmlReader;
use crate::namespace::{self, NodeKind, NodeRef};
use crate::node_data::AmlData;

/// Byte size of the common SDT header every AML table starts with.
pub const TABLE_HEADER_SIZE: usize = 36;

/// The common ACPI table header.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// Signature of this table.
    pub signature: [u8; 4],
    /// The total length of this table, including this header.
    pub length: u32,
    /// The ACPI specification revision this table complies with.
    pub revision: u8,
    /// The checksum byte balancing the whole table to a zero sum.
    pub checksum: u8,
    /// OEM ID, zero-padded.
    pub oem_id: [u8; 6],
    /// OEM table ID, zero-padded.
    pub oem_table_id: [u8; 8],
    /// OEM revision of this table.
    pub oem_revision: u32,
    /// Vendor ID of the compiler that produced the table.
    pub creator_id: [u8; 4],
    /// Revision of the compiler that produced the table.
    pub creator_revision: u32,
}

impl TableHeader {
    /// Read the 36-byte header off the front of the blob. Field-level
    /// validation is the interpreter's job.
    pub fn from_reader(reader: &mut AmlReader) -> TableHeader {
        TableHeader {
            signature: reader.zero_padded_array(),
            length: reader.dword(),
            revision: reader.byte(),
            checksum: reader.byte(),
            oem_id: reader.zero_padded_array(),
            oem_table_id: reader.zero_padded_array(),
            oem_revision: reader.dword(),
            creator_id: reader.zero_padded_array(),
            creator_revision: reader.dword(),
        }
    }
}

/// A decoded AML table: its header and the namespace built from its
/// term list. The namespace is append-only during decoding and treated
/// as immutable afterwards.
#[derive(Debug)]
pub struct Table {
    header: TableHeader,
    root: NodeRef,
}

impl Table {
    pub(crate) fn new(header: TableHeader) -> Result<Table> {
        Ok(Table {
            header,
            root: namespace::canonical_root()?,
        })
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn namespace_root(&self) -> NodeRef {
        self.root.clone()
    }

    /// Dump the namespace tree, one `<name>: <description>` line per
    /// node, indented two spaces per level. The root renders as `\`.
    pub fn print_namespace(&self, sink: &mut dyn Write) -> io::Result<()> {
        print_node(&self.root, 0, sink)
    }
}

fn print_node(node: &NodeRef, depth: usize, sink: &mut dyn Write) -> io::Result<()> {
    let inner = node.borrow();
    let name = inner.name();
    let name = if name.is_empty() { "\\" } else { name.as_str() };
    writeln!(
        sink,
        "{:indent$}{}: {}",
        "",
        name,
        describe(inner.kind()),
        indent = depth * 2
    )?;

    let mut cursor = inner.first_child();
    drop(inner);
    while let Some(child) = cursor {
        print_node(&child, depth + 1, sink)?;
        cursor = child.borrow().next_sibling();
    }
    Ok(())
}

fn describe(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Device => "Device".to_string(),
        NodeKind::Scope => "Scope".to_string(),
        NodeKind::Name(data) => {
            let mut description = data.type_name().to_string();
            if let AmlData::Integer { value, .. } = data {
                description.push_str(&format!(" with value {}, or 0x{:X}", value, value));
            }
            description
        }
        NodeKind::OpRegion { .. } => "Op. Region".to_string(),
        NodeKind::Field { .. } => "Field".to_string(),
        NodeKind::BufferField { .. } => "BufferField".to_string(),
        NodeKind::Method { start, end, flags } => format!(
            "Method(Args: {}, Start: {}, End: {}, Flags: {})",
            flags & 0x7,
            start,
            end,
            flags
        ),
        NodeKind::Processor { .. } => "Processor (Depr.)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_from_reader() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"DSDT");
        raw.extend_from_slice(&64_u32.to_le_bytes());
        raw.push(2); // revision
        raw.push(0x5A); // checksum
        raw.extend_from_slice(b"OEMIDX");
        raw.extend_from_slice(b"OEMTBLID");
        raw.extend_from_slice(&7_u32.to_le_bytes());
        raw.extend_from_slice(b"CRTR");
        raw.extend_from_slice(&9_u32.to_le_bytes());
        assert_eq!(raw.len(), TABLE_HEADER_SIZE);

        let mut reader = AmlReader::new(&raw);
        let header = TableHeader::from_reader(&mut reader);
        assert_eq!(&header.signature, b"DSDT");
        assert_eq!(header.length, 64);
        assert_eq!(header.revision, 2);
        assert_eq!(header.checksum, 0x5A);
        assert_eq!(&header.oem_id, b"OEMIDX");
        assert_eq!(&header.oem_table_id, b"OEMTBLID");
        assert_eq!(header.oem_revision, 7);
        assert_eq!(&header.creator_id, b"CRTR");
        assert_eq!(header.creator_revision, 9);
        assert_eq!(reader.position(), TABLE_HEADER_SIZE);
    }

    #[test]
    fn test_print_fresh_namespace() {
        let table = Table::new(TableHeader::default()).unwrap();
        let mut sink = Vec::new();
        table.print_namespace(&mut sink).unwrap();
        let dump = String::from_utf8(sink).unwrap();
        assert_eq!(
            dump,
            "\\: Device\n\
            \x20 _SB_: Device\n\
            \x20 _TZ_: Device\n\
            \x20 _PR_: Scope\n\
            \x20 _SI_: Scope\n\
            \x20 _GPE: Scope\n\
            \x20 _DS_: Device\n\
            \x20 _REV: Integer with value 1, or 0x1\n\
            \x20 _OSI: Integer with value 0, or 0x0\n"
        );
    }
}
