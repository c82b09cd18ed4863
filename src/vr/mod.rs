// src/vr/mod.rs

pub mod display;
pub mod effect;
pub mod polyfill;
pub mod session;

pub use display::{DisplayCapabilities, DisplayEvent, DisplayProvider, FrameData, PresentLayer, VrDisplay};
pub use effect::StereoEffect;
pub use polyfill::{CardboardDisplay, PolyfillProvider};
pub use session::{ModalState, Presentation, VrSession, VrState};
