#[cfg(test)]
mod tests {
    use std::mem::{align_of, offset_of, size_of};

    use crate::dpl::common::error::DplError;
    use crate::dpl::ffi::types::*;
    use crate::dpl::ffi::wide::{read_narrow, read_wide, to_wide_nul, write_wide, WChar, MAX_PATH};

    #[test]
    fn test_file_header_is_128_bytes() {
        assert_eq!(size_of::<IscRawFileHeader>(), 128);
        assert_eq!(offset_of!(IscRawFileHeader, version), 32);
        assert_eq!(offset_of!(IscRawFileHeader, max_width), 44);
        assert_eq!(offset_of!(IscRawFileHeader, d_inf), 52);
        assert_eq!(offset_of!(IscRawFileHeader, grab_mode), 68);
        assert_eq!(offset_of!(IscRawFileHeader, reserve), 80);
    }

    #[test]
    fn test_scalar_record_layouts() {
        assert_eq!(size_of::<IscCameraSpecificParameter>(), 16);
        assert_eq!(size_of::<Statistics>(), 24);
        assert_eq!(size_of::<Roi3D>(), 12);
        assert_eq!(size_of::<IscAreaDataStatistics>(), 84);
        assert_eq!(offset_of!(IscAreaDataStatistics, statistics_depth), 24);
        assert_eq!(offset_of!(IscAreaDataStatistics, roi_3d), 72);
        assert_eq!(size_of::<IscDataProcStartMode>(), 3);
        assert_eq!(offset_of!(IscGrabStartMode, isc_play_mode_parameter), 28);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_frame_layouts_on_64_bit() {
        assert_eq!(size_of::<ImageType>(), 24);
        assert_eq!(size_of::<DepthType>(), 16);
        assert_eq!(size_of::<IscCameraStatus>(), 16);

        assert_eq!(offset_of!(FrameData, frameNo), 16);
        assert_eq!(offset_of!(FrameData, p1), 32);
        assert_eq!(offset_of!(FrameData, color), 80);
        assert_eq!(offset_of!(FrameData, depth), 104);
        assert_eq!(offset_of!(FrameData, raw_color), 144);
        assert_eq!(size_of::<FrameData>(), 168);

        assert_eq!(offset_of!(IscImageInfo, frame_data), 32);
        assert_eq!(size_of::<IscImageInfo>(), 536);
        assert_eq!(align_of::<IscImageInfo>(), 8);
    }

    #[test]
    fn test_result_data_layout() {
        assert_eq!(size_of::<IscDataProcModuleStatus>(), 48);
        assert_eq!(offset_of!(IscDataProcResultData, status), 16);
        assert_eq!(offset_of!(IscDataProcResultData, module_status), 32);
        assert_eq!(offset_of!(IscDataProcResultData, isc_image_info), 224);
    }

    #[test]
    fn test_utility_parameter_layout() {
        assert_eq!(offset_of!(DplIscUtilityParameter, base_length), 8);
        assert_eq!(offset_of!(DplIscUtilityParameter, draw_outside_bounds), 40);
        assert_eq!(offset_of!(DplIscUtilityParameter, min_distance), 48);
        assert_eq!(size_of::<DplIscUtilityParameter>(), 96);
    }

    #[test]
    fn test_default_records_are_zeroed() {
        let info = IscImageInfo::default();
        for frame in &info.frame_data {
            assert_eq!(frame.p1.width, 0);
            assert!(frame.p1.image.is_null());
            assert!(frame.depth.image.is_null());
        }

        let config = IscDplConfiguration::default();
        assert!(!config.enabled_camera);
        assert!(config.log_file_path.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_wide_string_round_trip_in_fixed_buffer() {
        let mut buffer = [0 as WChar; MAX_PATH];
        write_wide(&mut buffer, "c:/temp/capture.dat").unwrap();
        assert_eq!(read_wide(&buffer), "c:/temp/capture.dat");

        // A shorter string must not leave the old tail behind.
        write_wide(&mut buffer, "./").unwrap();
        assert_eq!(read_wide(&buffer), "./");
    }

    #[test]
    fn test_wide_string_too_long_is_rejected() {
        let mut buffer = [0 as WChar; 4];
        let result = write_wide(&mut buffer, "abcd");
        assert!(matches!(result, Err(DplError::InvalidArgument(_))));

        write_wide(&mut buffer, "abc").unwrap();
        assert_eq!(buffer[3], 0);
    }

    #[test]
    fn test_wide_nul_terminated_argument() {
        let units = to_wide_nul("a.dat");
        assert_eq!(units.len(), 6);
        assert_eq!(units.last(), Some(&0));
    }

    #[test]
    fn test_narrow_marker_stops_at_nul() {
        let mut mark = [0u8; FILE_MARK_LEN];
        mark[..11].copy_from_slice(b"XC RAW DATA");
        assert_eq!(read_narrow(&mark), "XC RAW DATA");
    }
}
