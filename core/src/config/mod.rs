pub use integral_file::ConfigIntegralFile;

mod integral_file;
