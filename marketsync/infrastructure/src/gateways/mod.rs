pub mod mock;

pub use mock::{MockBarProcessor, MockBarProcessorParameters, MockExtendedDataGateway};
