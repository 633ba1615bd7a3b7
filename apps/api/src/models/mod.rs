pub mod classification;
pub mod clothing;
