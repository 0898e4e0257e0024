pub mod describe;
pub mod program_parser;
pub mod program_serializer;
pub mod words;

pub use describe::describe_tasks;
pub use program_parser::{ParseIssue, parse_block_header_text, parse_program, parse_statement_text};
pub use program_serializer::{
    block_header_line, component_lines, program_lines, serialize_program, statement_line,
};
pub use words::{to_singular, word_form};
