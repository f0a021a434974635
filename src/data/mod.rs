pub mod batchitem;
pub mod metroitem;
pub mod scaler;
