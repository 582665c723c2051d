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

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::aml_reader::AmlReader;
use crate::error::AmlError;

const ROOT_CHAR: u8 = b'\\';
const PARENT_PREFIX_CHAR: u8 = b'^';
const DUAL_NAME_PREFIX: u8 = 0x2E;
const MULTI_NAME_PREFIX: u8 = 0x2F;

/// One four-character namespace name: a lead character in `[A-Z_]`
/// followed by three characters in `[A-Z_0-9]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// The anonymous name carried by the namespace root.
    pub const fn empty() -> NameSeg {
        NameSeg([0_u8; 4])
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Result<NameSeg> {
        if !AmlReader::is_lead_name_char(bytes[0])
            || !AmlReader::is_name_char(bytes[1])
            || !AmlReader::is_name_char(bytes[2])
            || !AmlReader::is_name_char(bytes[3])
        {
            return Err(anyhow!(AmlError::InvalidNameSeg(bytes)));
        }
        Ok(NameSeg(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0_u8; 4]
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0)
            .unwrap_or("????")
            .trim_matches('\0')
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// The path starts at the namespace root (`\` prefix).
    Absolute,
    /// The path starts at the current scope, after climbing one parent
    /// per `^` prefix.
    Relative,
}

/// An AML namespace path: an absolute/relative prefix and zero or more
/// name segments. A path with no segments is a null name; an absolute
/// null name addresses the root itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameString {
    kind: PathKind,
    depth: usize,
    segments: Vec<NameSeg>,
}

impl NameString {
    /// Decode a name path from AML bytecode.
    ///
    /// NameString := <rootchar namepath> | <prefixpath namepath>
    /// NamePath   := NameSeg | DualNamePath | MultiNamePath | NullName
    pub fn from_reader(reader: &mut AmlReader) -> Result<NameString> {
        let mut kind = PathKind::Relative;
        let mut depth = 0;

        if reader.peek() == ROOT_CHAR {
            kind = PathKind::Absolute;
            reader.byte();
        } else {
            while reader.peek() == PARENT_PREFIX_CHAR && !reader.is_eof() {
                depth += 1;
                reader.byte();
            }
        }

        let count = match reader.peek() {
            0x00 => {
                reader.byte();
                return Ok(NameString {
                    kind,
                    depth,
                    segments: Vec::new(),
                });
            }
            MULTI_NAME_PREFIX => {
                reader.byte();
                let count = reader.byte();
                if count == 0 {
                    return Err(anyhow!(AmlError::InvalidNamePath(count, reader.position())));
                }
                usize::from(count)
            }
            DUAL_NAME_PREFIX => {
                reader.byte();
                2
            }
            c if AmlReader::is_lead_name_char(c) => 1,
            c => return Err(anyhow!(AmlError::InvalidNamePath(c, reader.position()))),
        };

        let mut segments = Vec::with_capacity(count);
        for _ in 0..count {
            segments.push(reader.name_segment()?);
        }

        Ok(NameString {
            kind,
            depth,
            segments,
        })
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn segments(&self) -> &[NameSeg] {
        &self.segments
    }

    pub fn is_null(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path with its final segment dropped, same prefix.
    pub fn dirname(&self) -> Result<NameString> {
        if self.segments.is_empty() {
            return Err(anyhow!(AmlError::InvalidNullName));
        }
        Ok(NameString {
            kind: self.kind,
            depth: self.depth,
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// The final segment of the path.
    pub fn basename(&self) -> Result<NameSeg> {
        self.segments
            .last()
            .copied()
            .ok_or_else(|| anyhow!(AmlError::InvalidNullName))
    }
}

impl fmt::Display for NameString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            PathKind::Absolute => f.write_str("\\")?,
            PathKind::Relative => {
                for _ in 0..self.depth {
                    f.write_str("^")?;
                }
            }
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for NameString {
    type Err = anyhow::Error;

    /// Parse the display form: optional `\` or `^` run, then dot-separated
    /// four-character segments.
    fn from_str(s: &str) -> Result<NameString> {
        let bytes = s.as_bytes();
        let mut kind = PathKind::Relative;
        let mut depth = 0;
        let mut at = 0;

        if bytes.first() == Some(&ROOT_CHAR) {
            kind = PathKind::Absolute;
            at = 1;
        } else {
            while bytes.get(at) == Some(&PARENT_PREFIX_CHAR) {
                depth += 1;
                at += 1;
            }
        }

        let mut segments = Vec::new();
        if at < bytes.len() {
            for part in s[at..].split('.') {
                let part = part.as_bytes();
                let mut seg = [0_u8; 4];
                for (slot, b) in seg.iter_mut().zip(part.iter()) {
                    *slot = *b;
                }
                if part.len() != 4 {
                    return Err(anyhow!(AmlError::InvalidNameSeg(seg)));
                }
                segments.push(NameSeg::from_bytes(seg)?);
            }
        }

        Ok(NameString {
            kind,
            depth,
            segments,
        })
    }
}
