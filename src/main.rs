use std::fs::File;
use std::path::Path;
use std::process::ExitCode;

use scattered_ray::domain::renderer::{Frame, RayTracer};
use scattered_ray::infrastructure::description::{DescriptionLoader, TomlDescriptionLoader};
use scattered_ray::infrastructure::image::PpmWriter;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("usage: {} <scene.toml>", args[0]);
        return ExitCode::FAILURE;
    }

    let description = match TomlDescriptionLoader::new(&args[1]).load() {
        Ok(description) => description,
        Err(error) => {
            println!("error parsing {}: {}", args[1], error);
            return ExitCode::FAILURE;
        }
    };

    let mut frame = Frame::new(description.window.width, description.window.height);
    let tracer = RayTracer::new(description.tracer, &description.scene);

    let stats = tracer.render(&description.scene, &description.camera, &mut frame);
    frame.normalize(&stats, description.window.white_balance_range);

    if description.window.make_dump {
        let dump_path = Path::new(&args[1]).with_extension("ppm");
        let file = match File::create(&dump_path) {
            Ok(file) => file,
            Err(error) => {
                println!("error creating {}: {}", dump_path.display(), error);
                return ExitCode::FAILURE;
            }
        };
        if let Err(error) = PpmWriter::new(file).write(&frame) {
            println!("error writing {}: {}", dump_path.display(), error);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
