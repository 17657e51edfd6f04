//! ICM-20948 IMU driver with optional RViz and rqt_plot debug views

use super::DescriptorError;
use crate::config::{
    Condition, GroupAction, LaunchDescription, OutputMode, PackageLocator, ProcessAction,
    Substitution,
};

pub const NAME: &str = "icm_20948";

/// Package providing the driver and the RViz config
pub const PACKAGE: &str = "icm_20948";

/// Driver parameters, each fed from the argument of the same name
const DRIVER_PARAMETERS: [&str; 5] = ["port", "time_out", "baudrate", "imu_topic", "frame_id"];

/// Topic suffixes plotted by the rqt_plot debug nodes
const PLOTS: [&str; 3] = [
    "/linear_acceleration/x:y:z",
    "/angular_velocity/x:y:z",
    "/orientation/x:y:z:w",
];

pub fn describe(locator: &dyn PackageLocator) -> Result<LaunchDescription, DescriptorError> {
    let rviz_config = locator
        .share_directory(PACKAGE)?
        .join("rviz2")
        .join("imu.rviz");

    let mut description = LaunchDescription::new();
    description
        .declare("port", "/dev/ttyACM0", "Port for the IMU")?
        .declare("time_out", "0.5", "Timeout for the IMU")?
        .declare("baudrate", "115200", "Baud rate for the IMU")?
        .declare("imu_topic", "imu", "IMU topic name")?
        .declare("frame_id", "imu_link", "Frame ID for the IMU")?
        .declare("debug", "false", "Enable debug nodes")?
        .declare(
            "rviz_config",
            rviz_config.to_string_lossy().into_owned(),
            "RViz config file",
        )?;

    let driver = DRIVER_PARAMETERS.iter().fold(
        ProcessAction::new("imu_node")
            .package(PACKAGE)
            .output(OutputMode::Screen),
        |node, name| node.parameter(*name, Substitution::arg(*name)),
    );

    let mut debug = GroupAction::when(Condition::if_true(Substitution::arg("debug"))).child(
        ProcessAction::new("rviz2")
            .package("rviz2")
            .arg("-d")
            .arg(Substitution::arg("rviz_config")),
    );
    for suffix in PLOTS {
        debug = debug.child(ProcessAction::new("rqt_plot").package("rqt_plot").arg(
            Substitution::join(["/".into(), Substitution::arg("imu_topic"), suffix.into()]),
        ));
    }

    description.add_action(driver).add_action(debug);
    Ok(description)
}
