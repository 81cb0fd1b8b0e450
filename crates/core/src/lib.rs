pub mod capture {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod test_pattern_source;
    }
}

pub mod recording {
    pub mod host_hooks;
    pub mod recorder_error;
    pub mod recording_controller;
    pub mod recording_state;
}

pub mod shared {
    pub mod constants;
    pub mod frame;
    pub mod pixel_format;
    pub mod recorder_settings;
    pub mod session_paths;
    pub mod video_metadata;
}

pub mod timestamps {
    pub mod domain {
        pub mod frame_timing;
        pub mod timestamp_log;
        pub mod timestamp_store;
    }
    pub mod infrastructure {
        pub mod npy_timestamp_store;
    }
}

pub mod video {
    pub mod domain {
        pub mod encoder_process;
        pub mod image_writer;
    }
    pub mod infrastructure {
        pub mod ffmpeg_process;
        pub mod image_file_writer;
    }
}
