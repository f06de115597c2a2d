//! Processing pipeline components.

mod coordinator;
mod processor;
mod scanner;

pub use coordinator::{
    ProcessCheck, check_distinct_dirs, collect_input_files, ensure_dir, file_stem,
    output_dir_for, output_path_for, should_process, split_paths, window_image_path,
    windows_dir_for,
};
pub use processor::{
    DivideOptions, DivideResult, ScanOptions, ScanResult, SegmentOptions, process_divide_file,
    process_scan_file, process_segment_file,
};
pub use scanner::{scan, timestamp_for};
