pub mod cleaner;
pub mod frequency;

pub use cleaner::{clean_events, read_cleaned_events, CleaningFilter, CleaningReport};
pub use frequency::{
    build_frequency_table, count_by_year, read_frequency_table, write_frequency_table,
};
