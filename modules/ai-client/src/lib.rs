pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use openai::{
    GatewayConfig, GenerationRequest, ModelGateway, OpenAiClient, RequestParam, ResponseFormat,
    ResponsesTransport,
};
pub use traits::TextGenerator;
pub use util::{strip_code_fences, truncate_to_char_boundary};
