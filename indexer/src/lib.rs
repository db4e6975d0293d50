pub mod es;
pub mod load;

pub use es::EsClient;
