//! Intrusive, heterogeneous command list in arena memory.
//!
//! Each appended command occupies exactly one arena allocation: a
//! [`NodeHeader`] followed by the payload. Headers link to the next node by
//! its [`Allocation`] descriptor, so the list costs no memory outside the
//! arena and walking it never touches the heap.
//!
//! The stream is only valid until its arena is reset. Resetting without
//! calling [`CommandStream::clear`] is detected: appends and walks report
//! [`StreamError::Stale`] instead of reading reclaimed memory.

use std::iter::FusedIterator;
use std::mem::{align_of, size_of};

use bytemuck::{bytes_of, pod_read_unaligned};
use drift_arena::{Allocation, Arena, ArenaError};

use crate::command::{
    Command, CommandKind, DrawPolyline, DrawText, DrawTriangles, NodeHeader, RenderCommand,
    SetOptions, SetUniforms,
};
use crate::error::StreamError;

/// An append-only list of render commands.
#[derive(Debug, Default)]
pub struct CommandStream {
    head: Option<Allocation>,
    tail: Option<Allocation>,
    count: usize,
}

/// Reference to an appended node, usable with [`CommandStream::get`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeRef {
    node: Allocation,
    kind: CommandKind,
}

impl NodeRef {
    /// Kind of the appended command.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The node's arena allocation (header and payload).
    pub fn allocation(&self) -> Allocation {
        self.node
    }
}

impl CommandStream {
    /// An empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `payload` as the new last node.
    ///
    /// On failure the stream is unchanged.
    pub fn append<C: Command>(
        &mut self,
        arena: &mut Arena,
        payload: C,
    ) -> Result<NodeRef, StreamError> {
        if let Some(tail) = &self.tail {
            arena.check(tail).map_err(classify)?;
        }

        let payload_offset = align_up(NodeHeader::SIZE, align_of::<C>());
        let size = payload_offset + size_of::<C>();
        let align = align_of::<NodeHeader>().max(align_of::<C>());
        let node = arena.allocate(size, align)?;

        let header = NodeHeader::new(C::KIND, payload_offset, size_of::<C>());
        let bytes = arena.bytes_mut(&node)?;
        bytes[..NodeHeader::SIZE].copy_from_slice(bytes_of(&header));
        bytes[payload_offset..].copy_from_slice(bytes_of(&payload));

        match self.tail {
            Some(tail) => link(arena, &tail, node)?,
            None => self.head = Some(node),
        }
        self.tail = Some(node);
        self.count += 1;
        Ok(NodeRef {
            node,
            kind: C::KIND,
        })
    }

    /// Append an already-tagged command.
    pub fn append_command(
        &mut self,
        arena: &mut Arena,
        command: RenderCommand,
    ) -> Result<NodeRef, StreamError> {
        match command {
            RenderCommand::SetOptions(c) => self.append(arena, c),
            RenderCommand::SetUniforms(c) => self.append(arena, c),
            RenderCommand::DrawTriangles(c) => self.append(arena, c),
            RenderCommand::DrawPolyline(c) => self.append(arena, c),
            RenderCommand::DrawText(c) => self.append(arena, c),
        }
    }

    /// Forget every node. Arena memory is not reclaimed.
    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
        self.count = 0;
    }

    /// Walk the nodes in append order.
    pub fn iter<'a>(&self, arena: &'a Arena) -> Commands<'a> {
        Commands {
            arena,
            next: self.head.unwrap_or(Allocation::NULL),
            remaining: self.count,
        }
    }

    /// Read back one appended node.
    pub fn get<'a>(&self, arena: &'a Arena, node: NodeRef) -> Result<CommandRef<'a>, StreamError> {
        CommandRef::read(arena, node.node)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no nodes have been appended since the last clear.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// A command node, borrowed from arena memory.
#[derive(Clone, Copy, Debug)]
pub struct CommandRef<'a> {
    node: Allocation,
    kind: CommandKind,
    payload: &'a [u8],
    next: Allocation,
}

impl<'a> CommandRef<'a> {
    fn read(arena: &'a Arena, node: Allocation) -> Result<Self, StreamError> {
        let malformed = StreamError::Malformed {
            offset: node.offset(),
        };
        let bytes = arena.bytes(&node).map_err(classify)?;
        let header: NodeHeader = bytes
            .get(..NodeHeader::SIZE)
            .map(pod_read_unaligned)
            .ok_or_else(|| malformed.clone())?;
        let kind =
            CommandKind::from_tag(header.kind).ok_or(StreamError::UnknownKind { tag: header.kind })?;
        let start = header.payload_offset as usize;
        let payload = start
            .checked_add(header.payload_len as usize)
            .and_then(|end| bytes.get(start..end))
            .ok_or(malformed)?;
        Ok(Self {
            node,
            kind,
            payload,
            next: header.next,
        })
    }

    /// The node's kind tag.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Raw payload bytes.
    pub fn payload_bytes(&self) -> &'a [u8] {
        self.payload
    }

    /// Copy the payload out as `C`.
    pub fn payload<C: Command>(&self) -> Result<C, StreamError> {
        if C::KIND != self.kind {
            return Err(StreamError::KindMismatch {
                expected: C::KIND,
                actual: self.kind,
            });
        }
        if self.payload.len() != size_of::<C>() {
            return Err(StreamError::Malformed {
                offset: self.node.offset(),
            });
        }
        Ok(pod_read_unaligned(self.payload))
    }

    /// The payload as a tagged [`RenderCommand`].
    pub fn decode(&self) -> Result<RenderCommand, StreamError> {
        Ok(match self.kind {
            CommandKind::SetOptions => self.payload::<SetOptions>()?.into(),
            CommandKind::SetUniforms => self.payload::<SetUniforms>()?.into(),
            CommandKind::DrawTriangles => self.payload::<DrawTriangles>()?.into(),
            CommandKind::DrawPolyline => self.payload::<DrawPolyline>()?.into(),
            CommandKind::DrawText => self.payload::<DrawText>()?.into(),
        })
    }

    /// A reference to this node.
    pub fn node(&self) -> NodeRef {
        NodeRef {
            node: self.node,
            kind: self.kind,
        }
    }
}

/// Iterator over a [`CommandStream`], produced by [`CommandStream::iter`].
///
/// Stops after the first error.
#[derive(Clone, Debug)]
pub struct Commands<'a> {
    arena: &'a Arena,
    next: Allocation,
    remaining: usize,
}

impl<'a> Iterator for Commands<'a> {
    type Item = Result<CommandRef<'a>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.next.is_null() {
            return None;
        }
        match CommandRef::read(self.arena, self.next) {
            Ok(cmd) => {
                self.remaining -= 1;
                self.next = cmd.next;
                Some(Ok(cmd))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Commands<'_> {}

fn link(arena: &mut Arena, tail: &Allocation, node: Allocation) -> Result<(), StreamError> {
    let bytes = arena.bytes_mut(tail).map_err(classify)?;
    let header_bytes = bytes
        .get_mut(..NodeHeader::SIZE)
        .ok_or(StreamError::Malformed {
            offset: tail.offset(),
        })?;
    let mut header: NodeHeader = pod_read_unaligned(header_bytes);
    header.next = node;
    header_bytes.copy_from_slice(bytes_of(&header));
    Ok(())
}

fn classify(err: ArenaError) -> StreamError {
    match err {
        ArenaError::StaleAllocation { offset, .. } => StreamError::Stale { offset },
        other => StreamError::Arena(other),
    }
}

fn align_up(n: usize, align: usize) -> usize {
    (n + align - 1) & !(align - 1)
}
