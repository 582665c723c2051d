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
use log::{debug, warn};

use crate::acpi_table::{Table, TableHeader, TABLE_HEADER_SIZE};
use crate::aml_reader::AmlReader;
use crate::error::AmlError;
use crate::name_string::NameString;
use crate::namespace::{self, Node, NodeKind, NodeRef};
use crate::node_data::{AmlData, IntegerWidth};

// Term and data opcodes handled by the decoder.
const ZERO_OP: u16 = 0x0000;
const ONE_OP: u16 = 0x0001;
const NAME_OP: u16 = 0x0008;
const BYTE_PREFIX: u16 = 0x000A;
const WORD_PREFIX: u16 = 0x000B;
const DWORD_PREFIX: u16 = 0x000C;
const STRING_PREFIX: u16 = 0x000D;
const QWORD_PREFIX: u16 = 0x000E;
const SCOPE_OP: u16 = 0x0010;
const BUFFER_OP: u16 = 0x0011;
const PACKAGE_OP: u16 = 0x0012;
const VAR_PACKAGE_OP: u16 = 0x0013;
const METHOD_OP: u16 = 0x0014;
const CREATE_DWORD_FIELD_OP: u16 = 0x008A;
const CREATE_WORD_FIELD_OP: u16 = 0x008B;
const CREATE_BYTE_FIELD_OP: u16 = 0x008C;
const CREATE_BIT_FIELD_OP: u16 = 0x008D;
const CREATE_QWORD_FIELD_OP: u16 = 0x008F;
const ONES_OP: u16 = 0x00FF;
const REVISION_OP: u16 = 0x5B30;
const OP_REGION_OP: u16 = 0x5B80;
const FIELD_OP: u16 = 0x5B81;
const DEVICE_OP: u16 = 0x5B82;
const PROCESSOR_OP: u16 = 0x5B83;

// Field element tags other than a bare NameSeg.
const RESERVED_FIELD: u16 = 0x0000;

const METHOD_ARG_SLOTS: usize = 8;

/// One record of the decoder's explicit scope stack: the scope new nodes
/// insert into, where the frame's term list began, and the exclusive
/// offset at which the frame expires. The argument slots are only
/// populated by frames representing method invocations, which a future
/// executor would push.
pub struct ParseFrame {
    scope: NodeRef,
    start: usize,
    end: usize,
    arguments: [AmlData; METHOD_ARG_SLOTS],
}

impl ParseFrame {
    pub fn new(scope: NodeRef, start: usize, end: usize) -> ParseFrame {
        ParseFrame {
            scope,
            start,
            end,
            arguments: Default::default(),
        }
    }

    pub fn scope(&self) -> &NodeRef {
        &self.scope
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn argument(&self, index: usize) -> Result<&AmlData> {
        self.arguments
            .get(index)
            .ok_or_else(|| anyhow!(AmlError::ArgumentIndex(index)))
    }

    pub fn set_argument(&mut self, index: usize, data: AmlData) -> Result<()> {
        match self.arguments.get_mut(index) {
            Some(slot) => {
                *slot = data;
                Ok(())
            }
            None => Err(anyhow!(AmlError::ArgumentIndex(index))),
        }
    }
}

/// Decoder for one AML table. Walks the term list with an explicit frame
/// stack (no host-stack recursion across scopes) and builds the
/// namespace as it goes. Method bodies are recorded and skipped, never
/// decoded.
pub struct Interpreter {
    frames: Vec<ParseFrame>,
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter { frames: Vec::new() }
    }

    /// Decode `data` as one AML table and build its namespace.
    ///
    /// AMLCode := DefBlockHeader TermList
    pub fn interpret(mut self, data: &[u8]) -> Result<Table> {
        if data.len() < TABLE_HEADER_SIZE {
            return Err(anyhow!(AmlError::InvalidHeader));
        }

        let mut reader = AmlReader::new(data);
        let header = TableHeader::from_reader(&mut reader);
        if header.length == 0 {
            return Err(anyhow!(AmlError::InvalidHeader));
        }

        let sum = reader.checksum();
        if sum != 0 {
            return Err(anyhow!(AmlError::ChecksumMismatch(sum)));
        }

        let table = Table::new(header)?;

        // The root frame is a pure scope holder: it expires at the end of
        // the blob and never seeks.
        self.push_frame(ParseFrame::new(
            table.namespace_root(),
            data.len(),
            data.len(),
        ));

        while !self.frames.is_empty() && !reader.is_eof() {
            let scope = match self.frames.last() {
                Some(frame) => frame.scope().clone(),
                None => break,
            };
            self.read_term(&mut reader, &scope)?;

            // Drop every frame whose term list has been consumed. The
            // cursor stays where the innermost body ended; method bodies
            // are skipped by the explicit seek in DefMethod.
            while self
                .frames
                .last()
                .map_or(false, |frame| reader.position() >= frame.end())
            {
                self.pop_frame();
            }
        }

        debug!(
            "term list complete at {:#x} of {:#x}",
            reader.position(),
            reader.len()
        );
        Ok(table)
    }

    fn push_frame(&mut self, frame: ParseFrame) {
        debug!(
            "entering parse frame '{}' with end at {:#x}",
            frame.scope.borrow().name(),
            frame.end
        );
        self.frames.push(frame);
    }

    fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            debug!(
                "leaving parse frame '{}' entered at {:#x}",
                frame.scope.borrow().name(),
                frame.start
            );
        }
    }

    fn read_term(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        if AmlReader::is_lead_name_char(reader.peek()) {
            // MethodInvocation := NameString TermArgList
            let path = NameString::from_reader(reader)?;
            warn!("method invocation '{}' at term level", path);
            return Err(anyhow!(AmlError::UnimplementedFeature("method invocation")));
        }

        let opcode = reader.opcode();
        debug!("term opcode {:#06x} at {:#x}", opcode, reader.position());
        match opcode {
            SCOPE_OP => self.process_def_scope(reader, scope),
            DEVICE_OP => self.process_def_device(reader, scope),
            NAME_OP => self.process_def_name(reader, scope),
            OP_REGION_OP => self.process_def_operation_region(reader, scope),
            FIELD_OP => self.process_def_field(reader, scope),
            METHOD_OP => self.process_def_method(reader, scope),
            PROCESSOR_OP => self.process_def_processor(reader, scope),
            CREATE_BIT_FIELD_OP | CREATE_BYTE_FIELD_OP | CREATE_WORD_FIELD_OP
            | CREATE_DWORD_FIELD_OP | CREATE_QWORD_FIELD_OP => {
                self.process_def_unit_field(reader, scope, opcode)
            }
            _ => Err(anyhow!(AmlError::UnimplementedOpcode("read_term", opcode))),
        }
    }

    fn process_def_scope(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefScope := ScopeOp PkgLength NameString TermList
        let opcode_start = reader.position() - 1;
        let package_length = reader.package_length();
        let path = NameString::from_reader(reader)?;

        // A scope re-opens a node that must already exist.
        let node = namespace::find_node(&path, scope)?;
        let end = opcode_start + package_length as usize;
        self.push_frame(ParseFrame::new(node, reader.position(), end));
        Ok(())
    }

    fn process_def_device(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefDevice := DeviceOp PkgLength NameString TermList
        let opcode_start = reader.position() - 2;
        let package_length = reader.package_length();
        let path = NameString::from_reader(reader)?;

        let node = Node::new(NodeKind::Device);
        namespace::insert_node(&path, scope, &node)?;

        let end = opcode_start + package_length as usize;
        self.push_frame(ParseFrame::new(node, reader.position(), end));
        Ok(())
    }

    fn process_def_processor(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefProcessor := ProcessorOp PkgLength NameString ProcID PblkAddr PblkLen TermList
        let opcode_start = reader.position() - 2;
        let package_length = reader.package_length();
        let path = NameString::from_reader(reader)?;
        let id = reader.byte();
        let pblk_addr = reader.dword();
        let pblk_len = reader.byte();

        let node = Node::new(NodeKind::Processor {
            id,
            pblk_addr,
            pblk_len,
        });
        namespace::insert_node(&path, scope, &node)?;

        let end = opcode_start + package_length as usize;
        self.push_frame(ParseFrame::new(node, reader.position(), end));
        Ok(())
    }

    fn process_def_method(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefMethod := MethodOp PkgLength NameString MethodFlags TermList
        let opcode_start = reader.position() - 1;
        let package_length = reader.package_length();
        let path = NameString::from_reader(reader)?;
        let flags = reader.byte();

        let start = reader.position();
        let end = opcode_start + package_length as usize;
        let node = Node::new(NodeKind::Method { start, end, flags });
        namespace::insert_node(&path, scope, &node)?;

        // The body is only replayed by a future executor; skip straight
        // past it to the next term.
        reader.set_position(end + 1);
        Ok(())
    }

    fn process_def_name(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefName := NameOp NameString DataRefObject
        let path = NameString::from_reader(reader)?;
        let data = self.read_data_ref_object(reader)?;

        let node = Node::new(NodeKind::Name(data));
        namespace::insert_node(&path, scope, &node)
    }

    fn process_def_operation_region(
        &mut self,
        reader: &mut AmlReader,
        scope: &NodeRef,
    ) -> Result<()> {
        // DefOpRegion := OpRegionOp NameString RegionSpace RegionOffset RegionLen
        let path = NameString::from_reader(reader)?;
        let space = reader.byte();
        let offset = self.read_term_arg(reader)?.as_integer()?;
        let length = self.read_term_arg(reader)?.as_integer()?;

        let node = Node::new(NodeKind::OpRegion {
            space,
            offset,
            length,
        });
        namespace::insert_node(&path, scope, &node)
    }

    fn process_def_field(&mut self, reader: &mut AmlReader, scope: &NodeRef) -> Result<()> {
        // DefField := FieldOp PkgLength NameString FieldFlags FieldList
        let opcode_start = reader.position() - 2;
        let package_length = reader.package_length();
        let path = NameString::from_reader(reader)?;
        let flags = reader.byte();

        let region = namespace::find_node(&path, scope)?;
        let end = opcode_start + package_length as usize;

        let mut bit_offset: i64 = 0;
        while reader.position() < end {
            bit_offset = self.process_field_element(reader, scope, &region, flags, bit_offset)?;
        }
        Ok(())
    }

    /// Decode one field element, returning the bit offset the next
    /// element starts at.
    fn process_field_element(
        &mut self,
        reader: &mut AmlReader,
        scope: &NodeRef,
        region: &NodeRef,
        flags: u8,
        bit_offset: i64,
    ) -> Result<i64> {
        // FieldElement := NamedField | ReservedField | AccessField |
        //                 ExtendedAccessField | ConnectField
        if AmlReader::is_lead_name_char(reader.peek()) {
            // NamedField := NameSeg PkgLength
            // No opcode, just a bare name segment.
            let name = reader.name_segment()?;
            let bit_width = reader.package_length();

            let node = Node::new(NodeKind::Field {
                region: Rc::downgrade(region),
                flags,
                bit_offset,
                bit_width,
            });
            namespace::insert_child(scope, name, &node)?;
            return Ok(bit_offset + bit_width);
        }

        let opcode = reader.opcode();
        match opcode {
            RESERVED_FIELD => {
                // ReservedField := 0x00 PkgLength
                // Padding only, no node.
                let bit_width = reader.package_length();
                Ok(bit_offset + bit_width)
            }
            _ => Err(anyhow!(AmlError::UnimplementedOpcode(
                "process_field_element",
                opcode
            ))),
        }
    }

    fn process_def_unit_field(
        &mut self,
        reader: &mut AmlReader,
        scope: &NodeRef,
        opcode: u16,
    ) -> Result<()> {
        // DefCreateXxxField := CreateXxxFieldOp SourceBuff ByteIndex NameString
        let buffer = self.read_term_arg(reader)?.as_buffer()?;
        let index = self.read_term_arg(reader)?.as_integer()?;
        let path = NameString::from_reader(reader)?;

        let bit_size: i64 = match opcode {
            CREATE_BIT_FIELD_OP => 1,
            CREATE_BYTE_FIELD_OP => 8,
            CREATE_WORD_FIELD_OP => 16,
            CREATE_DWORD_FIELD_OP => 32,
            CREATE_QWORD_FIELD_OP => 64,
            _ => {
                return Err(anyhow!(AmlError::UnimplementedOpcode(
                    "process_def_unit_field",
                    opcode
                )))
            }
        };
        // CreateBitField indexes bits, every other variant indexes bytes.
        let bit_offset = index * if bit_size == 1 { 1 } else { 8 };

        let node = Node::new(NodeKind::BufferField {
            buffer,
            bit_offset,
            bit_size,
        });
        namespace::insert_node(&path, scope, &node)
    }

    fn read_term_arg(&mut self, reader: &mut AmlReader) -> Result<AmlData> {
        // TermArg := ExpressionOpcode | DataObject | ArgObj | LocalObj
        if AmlReader::is_lead_name_char(reader.peek()) {
            return Err(anyhow!(AmlError::UnimplementedFeature(
                "name path evaluation"
            )));
        }

        let opcode = reader.opcode();
        self.read_data_object(reader, opcode)
    }

    fn read_data_object(&mut self, reader: &mut AmlReader, opcode: u16) -> Result<AmlData> {
        // DataObject := ComputationalData | DefPackage | DefVarPackage
        match opcode {
            PACKAGE_OP | VAR_PACKAGE_OP => self.read_package(reader, opcode),
            _ => self.read_computational_data(reader, opcode),
        }
    }

    fn read_data_ref_object(&mut self, reader: &mut AmlReader) -> Result<AmlData> {
        // DataRefObject := DataObject | ObjectReference
        let opcode = reader.opcode();
        self.read_data_object(reader, opcode)
    }

    fn read_computational_data(&mut self, reader: &mut AmlReader, opcode: u16) -> Result<AmlData> {
        // ComputationalData := ByteConst | WordConst | DWordConst | QWordConst |
        //                      String | ConstObj | RevisionOp | DefBuffer
        match opcode {
            BYTE_PREFIX => Ok(AmlData::Integer {
                value: i64::from(reader.byte() as i8),
                width: IntegerWidth::Byte,
            }),
            WORD_PREFIX => Ok(AmlData::Integer {
                value: i64::from(reader.word() as i16),
                width: IntegerWidth::Word,
            }),
            DWORD_PREFIX => Ok(AmlData::Integer {
                value: i64::from(reader.dword() as i32),
                width: IntegerWidth::DWord,
            }),
            QWORD_PREFIX => Ok(AmlData::Integer {
                value: reader.qword() as i64,
                width: IntegerWidth::QWord,
            }),
            STRING_PREFIX => Ok(AmlData::String(reader.string()?)),
            ZERO_OP => Ok(AmlData::Integer {
                value: 0,
                width: IntegerWidth::QWord,
            }),
            ONE_OP => Ok(AmlData::Integer {
                value: 1,
                width: IntegerWidth::QWord,
            }),
            ONES_OP => Ok(AmlData::Integer {
                value: -1,
                width: IntegerWidth::QWord,
            }),
            // Interpreters answer RevisionOp with their AML revision; 1
            // stands in until an executor exists.
            REVISION_OP => Ok(AmlData::Integer {
                value: 1,
                width: IntegerWidth::QWord,
            }),
            BUFFER_OP => self.read_def_buffer(reader),
            _ => Err(anyhow!(AmlError::UnimplementedOpcode(
                "read_computational_data",
                opcode
            ))),
        }
    }

    fn read_def_buffer(&mut self, reader: &mut AmlReader) -> Result<AmlData> {
        // DefBuffer := BufferOp PkgLength BufferSize ByteList
        let package_length = reader.package_length();
        let buffer_size = self.read_term_arg(reader)?.as_integer()?;
        if package_length > buffer_size {
            warn!(
                "buffer size overrun, package length {} with buffer size {}",
                package_length, buffer_size
            );
        }

        // The declared buffer size is authoritative; surplus bytes the
        // package length reserved stay in the stream for later terms.
        let size = if buffer_size < 0 {
            warn!("negative buffer size {}", buffer_size);
            0
        } else {
            buffer_size as usize
        };
        let mut data = vec![0_u8; size];
        reader.read_into(&mut data);
        Ok(AmlData::Buffer(Rc::new(data)))
    }

    fn read_package(&mut self, reader: &mut AmlReader, opcode: u16) -> Result<AmlData> {
        // DefPackage    := PackageOp PkgLength NumElements PackageElementList
        // DefVarPackage := VarPackageOp PkgLength VarNumElements PackageElementList
        let _package_length = reader.package_length();
        let num_elements = match opcode {
            PACKAGE_OP => i64::from(reader.byte()),
            VAR_PACKAGE_OP => self.read_term_arg(reader)?.as_integer()?,
            _ => {
                return Err(anyhow!(AmlError::UnimplementedOpcode(
                    "read_package",
                    opcode
                )))
            }
        };

        let mut elements = Vec::new();
        // PackageElementList := Nothing | <packageelement packageelementlist>
        for _ in 0..num_elements {
            // PackageElement := DataRefObject | NameString
            if AmlReader::is_lead_name_char(reader.peek()) {
                return Err(anyhow!(AmlError::UnimplementedFeature(
                    "name reference inside a package"
                )));
            }
            elements.push(self.read_data_ref_object(reader)?);
        }
        Ok(AmlData::Package(elements))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::find_node;

    // Wrap an AML body in a checksum-balanced SDT.
    fn build_table(body: &[u8]) -> Vec<u8> {
        let mut table = Vec::with_capacity(TABLE_HEADER_SIZE + body.len());
        table.extend_from_slice(b"DSDT"); // signature
        table.extend_from_slice(&((TABLE_HEADER_SIZE + body.len()) as u32).to_le_bytes());
        table.push(2); // revision
        table.push(0); // checksum, balanced below
        table.extend_from_slice(b"AMLDMP"); // oem id
        table.extend_from_slice(b"TESTTBL\0"); // oem table id
        table.extend_from_slice(&1_u32.to_le_bytes()); // oem revision
        table.extend_from_slice(b"AMLC"); // creator id
        table.extend_from_slice(&1_u32.to_le_bytes()); // creator revision
        table.extend_from_slice(body);

        let sum = table.iter().fold(0_u8, |acc, b| acc.wrapping_add(*b));
        table[9] = sum.wrapping_neg();
        table
    }

    fn interpret(data: &[u8]) -> Result<Table> {
        Interpreter::new().interpret(data)
    }

    fn node_at(table: &Table, path: &str) -> NodeRef {
        find_node(&path.parse().unwrap(), &table.namespace_root()).unwrap()
    }

    #[test]
    fn test_header_round_trip() {
        let body = [
            0x08, // NameOp
            b'_', b'F', b'O', b'O', // NameString "_FOO"
            0x0A, 0x42, // BytePrefix 0x42
        ];
        let data = build_table(&body);
        let table = interpret(&data).unwrap();

        let header = table.header();
        assert_eq!(&header.signature, b"DSDT");
        assert_eq!(header.length as usize, data.len());
        assert_eq!(header.revision, 2);
        assert_eq!(header.checksum, data[9]);
        assert_eq!(&header.oem_id, b"AMLDMP");
        assert_eq!(&header.oem_table_id, b"TESTTBL\0");
        assert_eq!(header.oem_revision, 1);
        assert_eq!(&header.creator_id, b"AMLC");
        assert_eq!(header.creator_revision, 1);

        match node_at(&table, "\\_FOO").borrow().kind() {
            NodeKind::Name(data) => assert_eq!(data.as_integer().unwrap(), 0x42),
            other => panic!("expected a Name node, got {:?}", other),
        }
    }

    #[test]
    fn test_checksum_detects_any_flipped_byte() {
        let pristine = build_table(&[0x08, b'_', b'F', b'O', b'O', 0x0A, 0x42]);
        assert!(interpret(&pristine).is_ok());

        for at in 0..pristine.len() {
            let mut corrupt = pristine.clone();
            corrupt[at] ^= 0x01;
            let err = interpret(&corrupt).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<AmlError>(),
                    Some(AmlError::ChecksumMismatch(_))
                ),
                "flipping byte {} gave {:?}",
                at,
                err
            );
        }
    }

    #[test]
    fn test_truncated_and_zero_length_headers() {
        let err = interpret(&[0x44, 0x53, 0x44, 0x54]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::InvalidHeader)
        ));

        let mut zero_length = build_table(&[]);
        // Zero the length field and rebalance the checksum.
        let sum: u8 = zero_length[4..8]
            .iter()
            .fold(0_u8, |acc, b| acc.wrapping_add(*b));
        zero_length[4..8].copy_from_slice(&[0; 4]);
        zero_length[9] = zero_length[9].wrapping_add(sum);
        let err = interpret(&zero_length).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::InvalidHeader)
        ));
    }

    #[test]
    fn test_canonical_root_contents() {
        let table = interpret(&build_table(&[])).unwrap();
        let root = table.namespace_root();

        let mut names = Vec::new();
        let mut cursor = root.borrow().first_child();
        while let Some(child) = cursor {
            names.push(child.borrow().name().to_string());
            cursor = child.borrow().next_sibling();
        }
        assert_eq!(
            names,
            ["_SB_", "_TZ_", "_PR_", "_SI_", "_GPE", "_DS_", "_REV", "_OSI"]
        );
    }

    #[test]
    fn test_scope_containment() {
        // Scope(\_SB_) { Device(DEV0) { Name(_HID, 0x11) } }
        let body = [
            0x10, 0x15, // ScopeOp, PkgLength 21
            0x5C, b'_', b'S', b'B', b'_', // NameString "\_SB_"
            0x5B, 0x82, 0x0E, // DeviceOp, PkgLength 14
            b'D', b'E', b'V', b'0', // NameString "DEV0"
            0x08, // NameOp
            b'_', b'H', b'I', b'D', // NameString "_HID"
            0x0A, 0x11, // BytePrefix 0x11
        ];
        let table = interpret(&build_table(&body)).unwrap();

        let hid = node_at(&table, "\\_SB_.DEV0._HID");
        match hid.borrow().kind() {
            NodeKind::Name(data) => assert_eq!(data.as_integer().unwrap(), 0x11),
            other => panic!("expected a Name node, got {:?}", other),
        }

        // The device landed under \_SB_, not under the root.
        let dev = node_at(&table, "\\_SB_.DEV0");
        let parent = dev.borrow().parent().unwrap();
        assert_eq!(parent.borrow().name().to_string(), "_SB_");
        assert!(matches!(dev.borrow().kind(), NodeKind::Device));
    }

    #[test]
    fn test_scope_must_already_exist() {
        // Scope(NOPE) over a node nothing declared.
        let body = [
            0x10, 0x06, // ScopeOp, PkgLength 6
            b'N', b'O', b'P', b'E', // NameString "NOPE"
        ];
        let err = interpret(&build_table(&body)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::PathNotFound(path)) if path == "NOPE"
        ));
    }

    #[test]
    fn test_method_body_is_skipped() {
        // Method(M001, 3) { <4 bytes of garbage> }, then one pad byte the
        // decoder's skip lands past.
        let body = [
            0x14, 0x0B, // MethodOp, PkgLength 11
            b'M', b'0', b'0', b'1', // NameString "M001"
            0x03, // MethodFlags: 3 arguments
            0xDE, 0xAD, 0xBE, 0xEF, // body, not valid AML
            0x00, // skipped by the +1 body seek
        ];
        let table = interpret(&build_table(&body)).unwrap();

        let method = node_at(&table, "\\M001");
        match *method.borrow().kind() {
            NodeKind::Method { start, end, flags } => {
                assert_eq!(flags & 0x7, 3);
                assert_eq!(start, TABLE_HEADER_SIZE + 7);
                assert_eq!(end, TABLE_HEADER_SIZE + 11);
                assert_eq!(end - start, 4);
            }
            ref other => panic!("expected a Method node, got {:?}", other),
        };
    }

    #[test]
    fn test_buffer_size_is_authoritative() {
        // Name(BUF0, Buffer(4) { 01 02 03 04 }) with a PkgLength claiming
        // 8, followed by a term that consumes the supposedly-reserved
        // bytes.
        let body = [
            0x08, // NameOp
            b'B', b'U', b'F', b'0', // NameString "BUF0"
            0x11, 0x08, // BufferOp, PkgLength 8 (overrun)
            0x0A, 0x04, // BufferSize: BytePrefix 4
            0x01, 0x02, 0x03, 0x04, // buffer contents
            0x08, // NameOp
            b'A', b'F', b'T', b'0', // NameString "AFT0"
            0x0A, 0x42, // BytePrefix 0x42
        ];
        let table = interpret(&build_table(&body)).unwrap();

        match node_at(&table, "\\BUF0").borrow().kind() {
            NodeKind::Name(data) => {
                assert_eq!(*data.as_buffer().unwrap(), vec![1, 2, 3, 4]);
            }
            other => panic!("expected a Name node, got {:?}", other),
        }
        match node_at(&table, "\\AFT0").borrow().kind() {
            NodeKind::Name(data) => assert_eq!(data.as_integer().unwrap(), 0x42),
            other => panic!("expected a Name node, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let body = [
            0x08, b'F', b'O', b'O', b'_', 0x0A, 0x01, // Name(FOO_, 1)
            0x08, b'F', b'O', b'O', b'_', 0x0A, 0x02, // Name(FOO_, 2)
        ];
        let err = interpret(&build_table(&body)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::DuplicateChild(name)) if name == "FOO_"
        ));
    }

    #[test]
    fn test_operation_region_and_field() {
        // OperationRegion(GPIO, SystemIO, 0x1000, 0x20)
        // Field(GPIO, 1) { FLD0, 8, Offset 8 reserved, FLD1, 16 }
        let body = [
            0x5B, 0x80, // OpRegionOp
            b'G', b'P', b'I', b'O', // NameString "GPIO"
            0x01, // RegionSpace: SystemIO
            0x0B, 0x00, 0x10, // RegionOffset: WordPrefix 0x1000
            0x0A, 0x20, // RegionLen: BytePrefix 0x20
            0x5B, 0x81, 0x14, // FieldOp, PkgLength 20
            b'G', b'P', b'I', b'O', // NameString "GPIO"
            0x01, // FieldFlags
            b'F', b'L', b'D', b'0', 0x08, // NamedField FLD0, 8 bits
            0x00, 0x08, // ReservedField, 8 bits
            b'F', b'L', b'D', b'1', 0x10, // NamedField FLD1, 16 bits
        ];
        let table = interpret(&build_table(&body)).unwrap();

        let region = node_at(&table, "\\GPIO");
        match *region.borrow().kind() {
            NodeKind::OpRegion {
                space,
                offset,
                length,
            } => {
                assert_eq!(space, 1);
                assert_eq!(offset, 0x1000);
                assert_eq!(length, 0x20);
            }
            ref other => panic!("expected an OpRegion node, got {:?}", other),
        }

        let fld0 = node_at(&table, "\\FLD0");
        match *fld0.borrow().kind() {
            NodeKind::Field {
                ref region,
                flags,
                bit_offset,
                bit_width,
            } => {
                assert_eq!(flags, 1);
                assert_eq!(bit_offset, 0);
                assert_eq!(bit_width, 8);
                let target = region.upgrade().unwrap();
                assert!(Rc::ptr_eq(&target, &node_at(&table, "\\GPIO")));
            }
            ref other => panic!("expected a Field node, got {:?}", other),
        }

        // The reserved element advanced the running bit offset.
        match *node_at(&table, "\\FLD1").borrow().kind() {
            NodeKind::Field {
                bit_offset,
                bit_width,
                ..
            } => {
                assert_eq!(bit_offset, 16);
                assert_eq!(bit_width, 16);
            }
            ref other => panic!("expected a Field node, got {:?}", other),
        }
    }

    #[test]
    fn test_create_dword_field() {
        // CreateDWordField(Buffer(4) { AA BB CC DD }, 2, CRF0)
        let body = [
            0x8A, // CreateDWordFieldOp
            0x11, 0x04, // BufferOp, PkgLength 4
            0x0A, 0x04, // BufferSize: BytePrefix 4
            0xAA, 0xBB, 0xCC, 0xDD, // buffer contents
            0x0A, 0x02, // ByteIndex: BytePrefix 2
            b'C', b'R', b'F', b'0', // NameString "CRF0"
        ];
        let table = interpret(&build_table(&body)).unwrap();

        match *node_at(&table, "\\CRF0").borrow().kind() {
            NodeKind::BufferField {
                ref buffer,
                bit_offset,
                bit_size,
            } => {
                assert_eq!(**buffer, vec![0xAA, 0xBB, 0xCC, 0xDD]);
                assert_eq!(bit_offset, 16);
                assert_eq!(bit_size, 32);
            }
            ref other => panic!("expected a BufferField node, got {:?}", other),
        }
    }

    #[test]
    fn test_create_bit_field_indexes_bits() {
        let body = [
            0x8D, // CreateBitFieldOp
            0x11, 0x01, // BufferOp, PkgLength 1
            0x0A, 0x01, // BufferSize: BytePrefix 1
            0xFF, // buffer contents
            0x0A, 0x05, // BitIndex: BytePrefix 5
            b'B', b'I', b'T', b'0', // NameString "BIT0"
        ];
        let table = interpret(&build_table(&body)).unwrap();

        match *node_at(&table, "\\BIT0").borrow().kind() {
            NodeKind::BufferField {
                bit_offset,
                bit_size,
                ..
            } => {
                assert_eq!(bit_offset, 5);
                assert_eq!(bit_size, 1);
            }
            ref other => panic!("expected a BufferField node, got {:?}", other),
        }
    }

    #[test]
    fn test_processor_block() {
        // Processor(CPU0, 1, 0x00001810, 6) { }
        let body = [
            0x5B, 0x83, 0x0D, // ProcessorOp, PkgLength 13
            b'C', b'P', b'U', b'0', // NameString "CPU0"
            0x01, // ProcID
            0x10, 0x18, 0x00, 0x00, // PblkAddr 0x1810
            0x06, // PblkLen
        ];
        let table = interpret(&build_table(&body)).unwrap();

        match *node_at(&table, "\\CPU0").borrow().kind() {
            NodeKind::Processor {
                id,
                pblk_addr,
                pblk_len,
            } => {
                assert_eq!(id, 1);
                assert_eq!(pblk_addr, 0x1810);
                assert_eq!(pblk_len, 6);
            }
            ref other => panic!("expected a Processor node, got {:?}", other),
        }
    }

    #[test]
    fn test_name_with_package() {
        // Name(PKG0, Package(3) { 1, "AB", 0x1234 })
        let body = [
            0x08, // NameOp
            b'P', b'K', b'G', b'0', // NameString "PKG0"
            0x12, 0x0B, 0x03, // PackageOp, PkgLength 11, NumElements 3
            0x01, // OneOp
            0x0D, b'A', b'B', 0x00, // StringPrefix "AB"
            0x0B, 0x34, 0x12, // WordPrefix 0x1234
        ];
        let table = interpret(&build_table(&body)).unwrap();

        match node_at(&table, "\\PKG0").borrow().kind() {
            NodeKind::Name(AmlData::Package(elements)) => {
                assert_eq!(elements.len(), 3);
                assert_eq!(elements[0].as_integer().unwrap(), 1);
                assert_eq!(elements[1], AmlData::String("AB".to_string()));
                assert_eq!(elements[2].as_integer().unwrap(), 0x1234);
            }
            other => panic!("expected a Package name, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_opcode_is_reported() {
        // IfOp is an expression opcode this decoder does not handle.
        let body = [0xA0, 0x02, 0x01];
        let err = interpret(&build_table(&body)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::UnimplementedOpcode("read_term", 0x00A0))
        ));
    }

    #[test]
    fn test_method_invocation_is_reported() {
        // A bare name path at term level is a method invocation.
        let body = [b'M', b'T', b'H', b'D'];
        let err = interpret(&build_table(&body)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AmlError>(),
            Some(AmlError::UnimplementedFeature("method invocation"))
        ));
    }

    #[test]
    fn test_namespace_dump_format() {
        let body = [
            0x14, 0x0B, // MethodOp, PkgLength 11
            b'M', b'0', b'0', b'1', // NameString "M001"
            0x03, // MethodFlags
            0xDE, 0xAD, 0xBE, 0xEF, // body
            0x00, // skipped pad
        ];
        let table = interpret(&build_table(&body)).unwrap();

        let mut sink = Vec::new();
        table.print_namespace(&mut sink).unwrap();
        let dump = String::from_utf8(sink).unwrap();
        assert!(dump.starts_with("\\: Device\n"));
        assert!(dump.contains("  _REV: Integer with value 1, or 0x1\n"));
        assert!(dump.contains("  M001: Method(Args: 3, Start: 43, End: 47, Flags: 3)\n"));
    }

    #[test]
    fn test_parse_frame_argument_slots() {
        let root = namespace::canonical_root().unwrap();
        let mut frame = ParseFrame::new(root, 0, 0);
        assert_eq!(*frame.argument(0).unwrap(), AmlData::None);

        frame
            .set_argument(
                7,
                AmlData::Integer {
                    value: 9,
                    width: IntegerWidth::QWord,
                },
            )
            .unwrap();
        assert_eq!(frame.argument(7).unwrap().as_integer().unwrap(), 9);

        assert!(frame.argument(8).is_err());
        assert!(frame.set_argument(8, AmlData::None).is_err());
    }
}
