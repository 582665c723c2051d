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

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use anyhow::{anyhow, Result};

use crate::error::AmlError;
use crate::name_string::{NameSeg, NameString, PathKind};
use crate::node_data::{AmlData, IntegerWidth};

pub type NodeRef = Rc<RefCell<Node>>;
pub type NodeWeak = Weak<RefCell<Node>>;

/// Payload of a namespace node.
#[derive(Debug)]
pub enum NodeKind {
    Device,
    Scope,
    Name(AmlData),
    OpRegion {
        space: u8,
        offset: i64,
        length: i64,
    },
    /// One named unit of a DefField list. `region` points back at the
    /// OperationRegion node the field windows into.
    Field {
        region: NodeWeak,
        flags: u8,
        bit_offset: i64,
        bit_width: i64,
    },
    /// A CreateXxxField window into a buffer value.
    BufferField {
        buffer: Rc<Vec<u8>>,
        bit_offset: i64,
        bit_size: i64,
    },
    /// A control method, recorded as the byte range of its body within
    /// the table blob. The body itself is never decoded here.
    Method {
        start: usize,
        end: usize,
        flags: u8,
    },
    /// Deprecated since ACPI 6.0, still present in vendor tables.
    Processor {
        id: u8,
        pblk_addr: u32,
        pblk_len: u8,
    },
}

/// One node of the namespace tree.
///
/// Children are owned through the first-child/next-sibling chain; the
/// parent link is weak, so dropping the root collects the whole tree.
#[derive(Debug)]
pub struct Node {
    name: NameSeg,
    parent: NodeWeak,
    child: Option<NodeRef>,
    sibling: Option<NodeRef>,
    kind: NodeKind,
}

impl Node {
    pub fn new(kind: NodeKind) -> NodeRef {
        Rc::new(RefCell::new(Node {
            name: NameSeg::empty(),
            parent: Weak::new(),
            child: None,
            sibling: None,
            kind,
        }))
    }

    pub fn name(&self) -> NameSeg {
        self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.upgrade()
    }

    pub fn first_child(&self) -> Option<NodeRef> {
        self.child.clone()
    }

    pub fn next_sibling(&self) -> Option<NodeRef> {
        self.sibling.clone()
    }
}

/// Look a direct child up by name. Linear over the sibling chain; scopes
/// in practice hold few enough children that no index is warranted.
pub fn find_child(parent: &NodeRef, name: NameSeg) -> Option<NodeRef> {
    let mut cursor = parent.borrow().child.clone();
    while let Some(node) = cursor {
        if node.borrow().name == name {
            return Some(node);
        }
        cursor = node.borrow().sibling.clone();
    }
    None
}

/// Attach `node` under `parent` as its last child. Fails when the parent
/// already has a child of that name.
pub fn insert_child(parent: &NodeRef, name: NameSeg, node: &NodeRef) -> Result<()> {
    if find_child(parent, name).is_some() {
        return Err(anyhow!(AmlError::DuplicateChild(name.to_string())));
    }

    {
        let mut inner = node.borrow_mut();
        inner.name = name;
        inner.parent = Rc::downgrade(parent);
        inner.sibling = None;
    }

    let first = parent.borrow().child.clone();
    match first {
        None => parent.borrow_mut().child = Some(node.clone()),
        Some(mut tail) => {
            loop {
                let next = tail.borrow().sibling.clone();
                match next {
                    Some(sibling) => tail = sibling,
                    None => break,
                }
            }
            tail.borrow_mut().sibling = Some(node.clone());
        }
    }
    Ok(())
}

/// Resolve a name path starting from `scope`.
///
/// Absolute paths climb to the root first; relative paths climb one
/// parent per `^` prefix, erroring when the prefix outruns the root.
/// Segments then descend child by child.
pub fn find_node(path: &NameString, scope: &NodeRef) -> Result<NodeRef> {
    let mut target = scope.clone();
    match path.kind() {
        PathKind::Absolute => loop {
            let parent = target.borrow().parent();
            match parent {
                Some(parent) => target = parent,
                None => break,
            }
        },
        PathKind::Relative => {
            for _ in 0..path.depth() {
                let parent = target.borrow().parent();
                target = parent.ok_or_else(|| anyhow!(AmlError::PathDepthOverflow))?;
            }
        }
    }

    for segment in path.segments() {
        target = find_child(&target, *segment)
            .ok_or_else(|| anyhow!(AmlError::PathNotFound(path.to_string())))?;
    }
    Ok(target)
}

/// Insert `node` at `path`, resolved from `scope`. The path's dirname
/// selects the insertion parent; the basename becomes the node's name.
pub fn insert_node(path: &NameString, scope: &NodeRef, node: &NodeRef) -> Result<()> {
    let name = path.basename()?;
    let parent = find_node(&path.dirname()?, scope)?;
    insert_child(&parent, name, node)
}

/// Build a fresh namespace root with the children every table starts
/// from: the well-known system scopes plus `_REV` and `_OSI`.
pub fn canonical_root() -> Result<NodeRef> {
    let root = Node::new(NodeKind::Device);
    insert_child(&root, NameSeg(*b"_SB_"), &Node::new(NodeKind::Device))?;
    insert_child(&root, NameSeg(*b"_TZ_"), &Node::new(NodeKind::Device))?;
    insert_child(&root, NameSeg(*b"_PR_"), &Node::new(NodeKind::Scope))?;
    insert_child(&root, NameSeg(*b"_SI_"), &Node::new(NodeKind::Scope))?;
    insert_child(&root, NameSeg(*b"_GPE"), &Node::new(NodeKind::Scope))?;
    insert_child(&root, NameSeg(*b"_DS_"), &Node::new(NodeKind::Device))?;
    insert_child(
        &root,
        NameSeg(*b"_REV"),
        &Node::new(NodeKind::Name(AmlData::Integer {
            value: 1,
            width: IntegerWidth::DWord,
        })),
    )?;
    insert_child(
        &root,
        NameSeg(*b"_OSI"),
        &Node::new(NodeKind::Name(AmlData::Integer {
            value: 0,
            width: IntegerWidth::DWord,
        })),
    )?;
    Ok(root)
}
