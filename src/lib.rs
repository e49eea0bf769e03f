pub mod color;
pub mod ensemble;
pub mod fresnel;
pub mod output;
pub mod particle;
pub mod session;
pub mod settings;
pub mod snell;
pub mod source;
pub mod stack;
pub mod stats;
