//! Pitch-accuracy scoring for sung recordings: fundamental-frequency tracking,
//! contour normalization, dynamic time warping and score mapping, plus the
//! feature store and CLI plumbing around them.

pub mod audio;
pub mod config;
pub mod error;
pub mod scoring;
pub mod services;
pub mod types;
