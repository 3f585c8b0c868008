pub mod command;
pub mod file;
pub mod http;
pub mod latex;
pub mod parse;
pub mod search;

pub use command::{CmdOutput, run_in_dir};
pub use file::{read_file, write_file};
pub use http::http_post_json;
pub use latex::{
    LatexError, Paper, compile, current_year, generate_pdf, write_document_class, year_at,
};
pub use parse::{extract_json_array, parse_integer, strip_code_fences};
pub use search::{
    ExaClient, PatentSummary, Search, SearchHit, SearchQuery, extract_summary, search_patents,
};
