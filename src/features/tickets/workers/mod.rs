mod history_writer;

pub use history_writer::HistoryWriter;
