pub mod bands;
pub mod descriptor;
pub mod error;
pub mod frame;
pub mod klapuri;
pub mod pipeline;
pub mod sink;
pub mod top_k;
pub mod transform;
pub mod whiten;
pub mod window;
