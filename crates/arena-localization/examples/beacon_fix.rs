use arena_localization::*;

fn main() {
    let config = RobotConfig {
        seed: Some(7),
        ..RobotConfig::default()
    };
    let arena = Arena::reference();
    let ticks = 50;
    let dt = 20.0; // milliseconds per tick

    match RobotState::new(config) {
        Ok(mut robot) => {
            println!("Initializing robot...");
            println!("  Arena:");
            println!("    Walls:            {}", arena.walls.len());
            println!("    Beacons:          {}", arena.beacons.len());
            println!("  Initial State:");
            println!("    Pose:             {}", robot.pose());
            println!("\nDriving...");

            robot.set_velocities(WheelVelocities::new(0.65, 0.5));
            for i in 0..ticks {
                match robot.step(dt, &arena) {
                    Ok(report) => {
                        let fix = report
                            .beacon_fix
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "none".to_string());
                        println!(
                            "Tick {:>2}: actual {} believed {} fix {} ({} beacons)",
                            i + 1,
                            report.pose,
                            report.believed,
                            fix,
                            report.visible_beacons
                        );
                    }
                    Err(e) => {
                        eprintln!("Error during tick {}: {}", i + 1, e);
                        break;
                    }
                }
            }

            let stats = robot.telemetry().error_stats();
            println!("\nRun complete.");
            if let Some(e) = stats.believed {
                println!("Mean filter error:   xy {:.3}, θ {:.3}°", e.xy(), e.theta);
            }
            if let Some(e) = stats.odometry {
                println!("Mean odometry error: xy {:.3}, θ {:.3}°", e.xy(), e.theta);
            }
            if let Some(e) = stats.beacon {
                println!("Mean beacon error:   xy {:.3}, θ {:.3}°", e.xy(), e.theta);
            }
        }
        Err(e) => {
            eprintln!("Failed to initialize robot: {}", e);
        }
    }
}
