//! Backing storage unit for arenas.
//!
//! `derive(Pod)` expands to `unsafe impl`s; no hand-written `unsafe`
//! blocks live here.

#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};

/// Backing the arena with 16-byte-aligned blocks makes any offset aligned
/// to at most 16 a truly aligned address.
#[repr(C, align(16))]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(crate) struct Block(#[allow(dead_code)] [u8; 16]);
