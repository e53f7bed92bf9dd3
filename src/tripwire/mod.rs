//! Tripwire — detects changes to definition files across a run.

pub mod hasher;
