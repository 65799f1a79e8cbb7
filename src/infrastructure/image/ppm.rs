use std::io::Write;

use snafu::prelude::*;

use crate::domain::renderer::Frame;

/// Writes a frame as ASCII PPM (P3): header, one `R G B` triplet line
/// per pixel in row-major order, values scaled from the normalized
/// [0, 1] range to [0, 255].
pub struct PpmWriter<W: Write> {
    writer: W,
}

impl<W: Write> PpmWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write(mut self, frame: &Frame) -> Result<(), SavePpmError> {
        let mut buffer = Vec::new();

        writeln!(buffer, "P3").expect("writing to a Vec never fails");
        writeln!(buffer, "## comment").expect("writing to a Vec never fails");
        writeln!(buffer, "{} {}", frame.width(), frame.height()).expect("writing to a Vec never fails");
        writeln!(buffer, "255").expect("writing to a Vec never fails");

        for row in 0..frame.height() {
            for column in 0..frame.width() {
                let pixel = frame.pixel(column, row);
                let channel = |v: f64| (v * 255.0) as u8;
                writeln!(
                    buffer,
                    "{} {} {}",
                    channel(pixel.x().into()),
                    channel(pixel.y().into()),
                    channel(pixel.z().into()),
                )
                .expect("writing to a Vec never fails");
            }
        }

        self.writer.write_all(&buffer).context(IoSnafu)?;
        self.writer.flush().context(IoSnafu)?;
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum SavePpmError {
    #[snafu(display("failed to write PPM image: {}", source))]
    Io { source: std::io::Error },
}

#[cfg(test)]
mod tests {
    use crate::domain::math::algebra::Vector;
    use crate::domain::math::numeric::Val;

    use super::*;

    #[test]
    fn ppm_writer_emits_header_and_row_major_pixels() {
        let mut frame = Frame::new(2, 2);
        frame.set_pixel(0, 0, Vector::broadcast(Val(1.0)));
        frame.set_pixel(1, 0, Vector::new(Val(1.0), Val(0.0), Val(0.0)));
        frame.set_pixel(0, 1, Vector::new(Val(0.0), Val(0.5), Val(0.0)));

        let mut output = Vec::new();
        PpmWriter::new(&mut output).write(&frame).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "P3");
        assert!(lines[1].starts_with('#'));
        assert_eq!(lines[2], "2 2");
        assert_eq!(lines[3], "255");
        assert_eq!(lines[4], "255 255 255");
        assert_eq!(lines[5], "255 0 0");
        assert_eq!(lines[6], "0 127 0");
        assert_eq!(lines[7], "0 0 0");
    }
}
