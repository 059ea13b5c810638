#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;

    use tempfile::TempDir;
    use tiff::decoder::{Decoder, DecodingResult};

    use crate::dpl::camera::frame::PlaneBuffer;
    use crate::dpl::camera::types::CameraGeometry;
    use crate::dpl::common::error::DplError;
    use crate::dpl::output::csv::{write_disparity_csv, write_distance_csv};
    use crate::dpl::output::sink::{DisplayPlane, FrameSink, Raster};
    use crate::dpl::output::tiff_sink::{encode, SnapshotConfig, TiffCompression, TiffSnapshotSink};
    use crate::dpl::utility::facade::ImageView;

    fn decode(bytes: Vec<u8>) -> ((u32, u32), Vec<u8>) {
        let mut decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        let dimensions = decoder.dimensions().unwrap();
        match decoder.read_image().unwrap() {
            DecodingResult::U8(data) => (dimensions, data),
            _ => panic!("expected 8-bit samples"),
        }
    }

    #[test]
    fn test_encode_gray_plane() {
        let mut plane = PlaneBuffer::<u8>::new(2, 2, 1);
        plane.copy_rotated(&[1, 2, 3, 4], 2, 2, 1);

        let bytes = encode(&Raster::from(&plane), TiffCompression::None).unwrap();
        let (dimensions, data) = decode(bytes);
        assert_eq!(dimensions, (2, 2));
        assert_eq!(data, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_encode_swaps_bgr_to_rgb() {
        let bgr = [10u8, 20, 30, 40, 50, 60];
        let view = ImageView {
            width: 2,
            height: 1,
            data: &bgr,
        };

        let bytes = encode(&Raster::from(view), TiffCompression::Lzw).unwrap();
        let (dimensions, data) = decode(bytes);
        assert_eq!(dimensions, (2, 1));
        assert_eq!(data, vec![30, 20, 10, 60, 50, 40]);
    }

    #[test]
    fn test_encode_rejects_bad_rasters() {
        let short = Raster {
            width: 4,
            height: 4,
            channels: 1,
            data: &[0; 8],
        };
        assert!(matches!(encode(&short, TiffCompression::None), Err(DplError::InvalidArgument(_))));

        let empty = Raster {
            width: 0,
            height: 4,
            channels: 1,
            data: &[],
        };
        assert!(matches!(encode(&empty, TiffCompression::None), Err(DplError::InvalidDimensions(0, 4))));

        let two_channel = Raster {
            width: 1,
            height: 1,
            channels: 2,
            data: &[0, 0],
        };
        assert!(matches!(encode(&two_channel, TiffCompression::None), Err(DplError::InvalidArgument(_))));
    }

    #[test]
    fn test_snapshot_sink_writes_every_nth_poll() {
        let dir = TempDir::new().unwrap();
        let config = SnapshotConfig::builder()
            .directory(dir.path().join("snap"))
            .every(2)
            .compression(TiffCompression::DeflateFast)
            .build();
        let mut sink = TiffSnapshotSink::new(config).unwrap();

        let plane = PlaneBuffer::<u8>::new(3, 2, 1);
        for _ in 0..3 {
            sink.show(DisplayPlane::Base, Raster::from(&plane)).unwrap();
            sink.end_frame().unwrap();
        }

        // Polls 0 and 2 are due.
        assert_eq!(sink.written(), 2);
        let path = sink.path_of(DisplayPlane::Base);
        assert!(path.ends_with("snap/base.tiff"));
        let (dimensions, _) = decode(fs::read(&path).unwrap());
        assert_eq!(dimensions, (3, 2));
        assert!(!path.with_extension("tiff.tmp").exists());
        assert!(!sink.path_of(DisplayPlane::Color).exists());
    }

    #[test]
    fn test_snapshot_config_defaults() {
        let config = SnapshotConfig::builder().every(0).build();
        assert_eq!(config.every, 1);
        assert_eq!(config.compression, TiffCompression::None);
        assert_eq!(SnapshotConfig::default().every, 10);
    }

    #[test]
    fn test_disparity_csv_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Disparity_0.csv");

        write_disparity_csv(&path, 3, 2, &[0.0, 1.5, 2.0, 3.0, 4.25, 5.0]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0,1.5,2\n3,4.25,5\n");
    }

    #[test]
    fn test_distance_csv_zeroes_pixels_at_infinity() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Distance_0.csv");
        let geometry = CameraGeometry {
            base_length: 0.1,
            bf: 40.0,
            d_inf: 2.0,
            max_width: 2,
            max_height: 2,
        };

        write_distance_csv(&path, &geometry, 2, 2, &[1.0, 2.0, 6.0, 12.0]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "0,0\n10,4\n");
    }

    #[test]
    fn test_csv_rejects_short_input() {
        let dir = TempDir::new().unwrap();
        let result = write_disparity_csv(dir.path().join("x.csv"), 4, 4, &[0.0; 3]);
        assert!(matches!(result, Err(DplError::InvalidArgument(_))));
        assert!(!dir.path().join("x.csv").exists());
    }
}
