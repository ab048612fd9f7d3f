//! SketchRelay — media composition.
//!
//! Turns finished chains into looping animations: captions are laid out at
//! the largest font size that fits, drawings are scaled to the frame, every
//! frame is reduced to a fixed palette with error diffusion, and the frames
//! are encoded as one infinitely looping GIF per chain. Also normalizes
//! uploaded drawings.

pub mod animation;
pub mod caption;
pub mod compositor;
pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod palette;
pub mod placeholder;
pub mod upload;
