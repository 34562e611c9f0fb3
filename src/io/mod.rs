pub mod document_io;
