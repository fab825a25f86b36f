mod command_input;
mod footer;
mod input;
mod key_result;
mod prompt;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use footer::draw_footer;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use prompt::{PromptEvent, PromptInput};
pub use search_input::{SearchEvent, SearchInput};
