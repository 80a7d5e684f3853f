pub mod mock_completions_server;

pub use mock_completions_server::MockCompletionsServer;
