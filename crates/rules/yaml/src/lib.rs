mod frontend;
mod parser;

pub use frontend::YamlFrontend;
