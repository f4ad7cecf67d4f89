#[cfg(test)]
mod module_tests {
    use std::fs;
    use std::path::PathBuf;

    use nalgebra::Point3;

    use crate::actors::messages::Telemetry;
    use crate::config::SETTINGS;
    use crate::frame::{Calibration, Image};
    use crate::modules::camera::PinholeStereoCamera;
    use crate::modules::grabber::{DatasetGrabber, SyntheticGrabber};
    use crate::modules::module_definitions::{CameraGrabber, GrabError, Visualizer};
    use crate::modules::visualizer::TrajectoryVisualizer;
    use crate::pose::Pose;

    const W: u32 = 8;
    const H: u32 = 6;

    fn test_calibration() -> Calibration {
        Calibration::from_parts(400.0, 420.0, 4.0, 3.0, 0.12)
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stvo_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_png(dir: &PathBuf, name: &str, value: u8) {
        let pixels = vec![value; (W * H) as usize];
        let img = image::GrayImage::from_raw(W, H, pixels).unwrap();
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn synthetic_grabber_is_deterministic_and_finite() {
        let mut grabber = SyntheticGrabber::new(2, test_calibration());
        assert!(matches!(grabber.calibration(), Err(GrabError::DeviceUnavailable(_))));

        grabber.open(W, H, "FRAMERATE_20").unwrap();
        let calibration = grabber.calibration().unwrap();
        assert_eq!(calibration.fx(), 400.0);
        assert_eq!(calibration.baseline, 0.12);

        let mut left_a = Image::new(W, H);
        let mut right_a = Image::new(W, H);
        grabber.grab_stereo_pair(&mut left_a, &mut right_a).unwrap();
        // Right image carries the fake disparity offset
        assert_ne!(left_a.as_slice(), right_a.as_slice());

        let mut left_b = Image::new(W, H);
        let mut right_b = Image::new(W, H);
        grabber.grab_stereo_pair(&mut left_b, &mut right_b).unwrap();
        // The gradient drifts with the frame count
        assert_ne!(left_a.as_slice(), left_b.as_slice());

        assert!(matches!(
            grabber.grab_stereo_pair(&mut left_b, &mut right_b),
            Err(GrabError::EndOfStream)
        ));
    }

    #[test]
    fn dataset_grabber_replays_pairs_in_order() {
        let base = scratch_dir("dataset_ok");
        let left_dir = base.join("left");
        let right_dir = base.join("right");
        fs::create_dir_all(&left_dir).unwrap();
        fs::create_dir_all(&right_dir).unwrap();
        for (i, value) in [10u8, 20, 30].iter().enumerate() {
            write_png(&left_dir, &format!("{:03}.png", i), *value);
            write_png(&right_dir, &format!("{:03}.png", i), value + 1);
        }

        let mut grabber = DatasetGrabber::new(
            left_dir.to_str().unwrap().to_string(),
            right_dir.to_str().unwrap().to_string(),
            test_calibration(),
        );
        // High rate so pacing does not slow the test down
        grabber.open(W, H, "FRAMERATE_1000").unwrap();

        let mut left = Image::new(W, H);
        let mut right = Image::new(W, H);
        for value in [10u8, 20, 30] {
            grabber.grab_stereo_pair(&mut left, &mut right).unwrap();
            assert!(left.as_slice().iter().all(|px| *px == value));
            assert!(right.as_slice().iter().all(|px| *px == value + 1));
        }
        assert!(matches!(
            grabber.grab_stereo_pair(&mut left, &mut right),
            Err(GrabError::EndOfStream)
        ));
    }

    #[test]
    fn dataset_grabber_rejects_unpaired_sequences() {
        let base = scratch_dir("dataset_unpaired");
        let left_dir = base.join("left");
        let right_dir = base.join("right");
        fs::create_dir_all(&left_dir).unwrap();
        fs::create_dir_all(&right_dir).unwrap();
        write_png(&left_dir, "000.png", 1);
        write_png(&left_dir, "001.png", 2);
        write_png(&right_dir, "000.png", 1);

        let mut grabber = DatasetGrabber::new(
            left_dir.to_str().unwrap().to_string(),
            right_dir.to_str().unwrap().to_string(),
            test_calibration(),
        );
        assert!(matches!(
            grabber.open(W, H, "FRAMERATE_20"),
            Err(GrabError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn dataset_grabber_rejects_bad_profiles_and_sizes() {
        let base = scratch_dir("dataset_bad");
        let left_dir = base.join("left");
        let right_dir = base.join("right");
        fs::create_dir_all(&left_dir).unwrap();
        fs::create_dir_all(&right_dir).unwrap();
        // Wrong resolution relative to the rig's buffers
        let pixels = vec![0u8; 16 * 16];
        image::GrayImage::from_raw(16, 16, pixels)
            .unwrap()
            .save(left_dir.join("000.png"))
            .unwrap();
        write_png(&right_dir, "000.png", 1);

        let mut grabber = DatasetGrabber::new(
            left_dir.to_str().unwrap().to_string(),
            right_dir.to_str().unwrap().to_string(),
            test_calibration(),
        );
        assert!(matches!(
            grabber.open(W, H, "NOT_A_PROFILE"),
            Err(GrabError::DeviceUnavailable(_))
        ));

        grabber.open(W, H, "FRAMERATE_1000").unwrap();
        let mut left = Image::new(W, H);
        let mut right = Image::new(W, H);
        assert!(matches!(
            grabber.grab_stereo_pair(&mut left, &mut right),
            Err(GrabError::BadFrame(_))
        ));
    }

    #[test]
    fn trajectory_visualizer_chains_increments_into_a_file() {
        let base = scratch_dir("trajectory");
        let results_folder = base.to_str().unwrap().to_string();

        {
            let mut vis = TrajectoryVisualizer::new(results_folder.clone(), "trajectory.txt".to_string());
            let step = Pose::new(nalgebra::Vector3::new(0.1, 0.0, 0.0), nalgebra::Matrix3::identity());
            for i in 0..3u64 {
                vis.set_telemetry(&Telemetry { frame_index: i, ..Default::default() });
                vis.set_pose(&step);
                vis.refresh();
            }
            // Dropping flushes the trajectory
        }

        let contents = fs::read_to_string(base.join("trajectory.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let cols: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(cols.len(), 8);
            assert_eq!(cols[0], i.to_string());
            let tx: f64 = cols[1].parse().unwrap();
            assert!((tx - 0.1 * (i + 1) as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn camera_model_projects_and_unprojects() {
        let camera = PinholeStereoCamera::from_calibration(W, H, &test_calibration());
        assert_eq!(camera.bf(), 0.12 * 400.0);

        let point = Point3::new(0.5, -0.25, 2.0);
        let (u, v) = camera.project(&point);
        let disparity = camera.bf() / point.z;
        let recovered = camera.unproject_stereo(u, v, disparity).unwrap();
        assert!((recovered.x - point.x).abs() < 1e-9);
        assert!((recovered.y - point.y).abs() < 1e-9);
        assert!((recovered.z - point.z).abs() < 1e-9);

        assert!(camera.unproject_stereo(4.0, 3.0, 0.0).is_none());
    }

    #[test]
    fn image_fill_rejects_size_mismatch() {
        let mut image = Image::new(W, H);
        assert!(image.fill_from(&vec![0u8; 3]).is_err());
        assert!(image.fill_from(&vec![7u8; (W * H) as usize]).is_ok());
        assert!(image.as_slice().iter().all(|px| *px == 7));
    }

    #[test]
    fn settings_round_trip() {
        SETTINGS.insert("MODULE_TESTS", "alpha", 3);
        SETTINGS.insert("MODULE_TESTS", "beta", 2.5);
        SETTINGS.insert("MODULE_TESTS", "gamma", true);
        SETTINGS.insert("MODULE_TESTS", "delta", "stereo".to_string());

        assert_eq!(SETTINGS.get::<i32>("MODULE_TESTS", "alpha"), 3);
        assert_eq!(SETTINGS.get::<f64>("MODULE_TESTS", "beta"), 2.5);
        assert!(SETTINGS.get::<bool>("MODULE_TESTS", "gamma"));
        assert_eq!(SETTINGS.get::<String>("MODULE_TESTS", "delta"), "stereo");
    }

    #[test]
    fn config_files_load_into_settings() {
        let base = scratch_dir("config");
        let system_fn = base.join("system.yaml");
        let camera_fn = base.join("camera.yaml");

        fs::write(
            &system_fn,
            "system:\n  log_level: debug\n  results_folder: results\n  trajectory_file_name: trajectory.txt\n  scene_config: scene_config.ini\n  fps: 20.0\n  show_visualizer: false\nmodules:\n  - name: GRABBER\n    tag: synthetic\n    settings:\n      - name: frame_limit\n        type: i32\n        value: 100\n  - name: TRACKER\n    tag: \"null\"\n    settings: []\n  - name: VISUALIZER\n    tag: trajectory\n    settings: []\n",
        )
        .unwrap();
        fs::write(
            &camera_fn,
            "width: 640\nheight: 480\nframe_rate_profile: FRAMERATE_20\nfx: 660.0\nfy: 660.0\ncx: 320.0\ncy: 240.0\nbaseline: 0.12\n",
        )
        .unwrap();

        let (modules, log_level) = crate::config::load_config(
            system_fn.to_str().unwrap(),
            camera_fn.to_str().unwrap(),
        )
        .unwrap();

        assert_eq!(log_level, "debug");
        assert_eq!(modules.len(), 3);
        assert_eq!(modules[0].name, "GRABBER");
        assert_eq!(modules[0].tag, "synthetic");

        assert_eq!(SETTINGS.get::<i32>("GRABBER", "frame_limit"), 100);
        assert_eq!(SETTINGS.get::<i32>("CAMERA", "width"), 640);
        assert_eq!(SETTINGS.get::<String>("CAMERA", "frame_rate_profile"), "FRAMERATE_20");
        assert_eq!(SETTINGS.get::<f64>("CAMERA", "baseline"), 0.12);

        let conf = crate::config::RigConf::from_settings();
        assert_eq!(conf.width, 640);
        assert_eq!(conf.height, 480);
    }
}
