// Analysis module - acoustic feature extraction
//
// Only frame-averaged spectral features live here; classification happens
// in `crate::model` on the resulting vector.

pub mod features;
