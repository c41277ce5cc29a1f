use arena_kinematics::*;

fn main() {
    let wheel_separation = 60.0;
    let kinematics_result = DifferentialDrive::new(wheel_separation);

    let mut current_pose = Pose::new(400.0, 175.0, 0.0);
    let velocities = WheelVelocities::new(0.65, 0.5); // right wheel slower: clockwise arc
    let dt = 2.0; // kinematic time units per step
    let num_steps = 12;

    match kinematics_result {
        Ok(kinematics) => {
            println!("Initializing simulation...");
            println!("  Differential Drive Parameters:");
            println!("    Wheel Separation: {}", kinematics.wheel_separation());
            match kinematics.icc(current_pose, velocities) {
                Some(icc) => println!("    ICC:              {}", icc),
                None => println!("    ICC:              none (straight line)"),
            }
            println!("  Initial State:");
            println!("    Pose:             {}", current_pose);
            println!("    Wheel Velocities: {}", velocities);
            println!("  Simulation Settings:");
            println!("    Time Step:        {}", dt);
            println!("    Num Steps:        {}", num_steps);
            println!("\nSimulating...");

            for i in 0..num_steps {
                match kinematics.update_pose(current_pose, velocities, dt) {
                    Ok(new_pose) => {
                        current_pose = new_pose;
                        println!("Step {:>2}: Pose: {}", i + 1, current_pose);
                    }
                    Err(e) => {
                        eprintln!("Error during simulation step {}: {}", i + 1, e);
                        break;
                    }
                }
            }

            println!("\nSimulation complete.");
            println!("Final Pose: {:?}", current_pose);
        }
        Err(e) => {
            eprintln!("Failed to initialize kinematics: {}", e);
            eprintln!("Please ensure wheel_separation ({}) is positive.", wheel_separation);
        }
    }
}
