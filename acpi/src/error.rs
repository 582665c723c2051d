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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmlError {
    #[error("Table is too short for an SDT header, or the header reports a zero length.")]
    InvalidHeader,
    #[error("Table checksum is 0x{0:02X}, the byte sum of a well-formed table is zero.")]
    ChecksumMismatch(u8),
    #[error("Invalid byte 0x{0:02X} in name path at offset 0x{1:X}.")]
    InvalidNamePath(u8, usize),
    #[error("Invalid name segment {0:?}, expected [A-Z_] followed by three [A-Z_0-9].")]
    InvalidNameSeg([u8; 4]),
    #[error("No node found at path '{0}'.")]
    PathNotFound(String),
    #[error("Path prefix climbs above the namespace root.")]
    PathDepthOverflow,
    #[error("A child named '{0}' already exists in this scope.")]
    DuplicateChild(String),
    #[error("A null name path has no segments to resolve.")]
    InvalidNullName,
    #[error("Invalid byte 0x{0:02X} in string literal.")]
    InvalidString(u8),
    #[error("Unimplemented opcode 0x{1:04X} in {0}.")]
    UnimplementedOpcode(&'static str, u16),
    #[error("{0} is not implemented.")]
    UnimplementedFeature(&'static str),
    #[error("Expected a {expected} value, found {found}.")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Method argument index {0} is out of bounds.")]
    ArgumentIndex(usize),
}
