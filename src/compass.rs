/// Wrap an angle into [0, 360).
pub fn wrap_360(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Wrap an angle into (-180, 180]. Exactly ±180 maps to +180.
pub fn wrap_180(angle: f64) -> f64 {
    let wrapped = wrap_360(angle);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// 8-point compass rose, used to label headings in status output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Point {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

const ROSE: [Point; 8] = [
    Point::N,
    Point::NE,
    Point::E,
    Point::SE,
    Point::S,
    Point::SW,
    Point::W,
    Point::NW,
];

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl Point {
    /// Nearest compass point to a heading in degrees; any input is wrapped first.
    pub fn from_heading(heading: f64) -> Self {
        // each point covers 45 degrees, centered on its nominal bearing
        let sector = ((wrap_360(heading) + 22.5) / 45.0) as usize % ROSE.len();
        ROSE[sector]
    }

    pub fn name(&self) -> &str {
        match self {
            Point::N => "north",
            Point::NE => "northeast",
            Point::E => "east",
            Point::SE => "southeast",
            Point::S => "south",
            Point::SW => "southwest",
            Point::W => "west",
            Point::NW => "northwest",
        }
    }

    pub fn abbreviation(&self) -> &str {
        match self {
            Point::N => "N",
            Point::NE => "NE",
            Point::E => "E",
            Point::SE => "SE",
            Point::S => "S",
            Point::SW => "SW",
            Point::W => "W",
            Point::NW => "NW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_360() {
        assert_eq!(wrap_360(370.0), 10.0);
        assert_eq!(wrap_360(-10.0), 350.0);
        assert_eq!(wrap_360(360.0), 0.0);
        assert_eq!(wrap_360(0.0), 0.0);
    }

    #[test]
    fn test_wrap_180_boundaries() {
        assert_eq!(wrap_180(180.0), 180.0);
        assert_eq!(wrap_180(-180.0), 180.0);
        assert_eq!(wrap_180(190.0), -170.0);
        assert_eq!(wrap_180(-190.0), 170.0);
        assert_eq!(wrap_180(540.0), 180.0);
        assert_eq!(wrap_180(0.0), 0.0);
    }

    #[test]
    fn test_wrap_180_range() {
        let mut angle = -1080.0;
        while angle <= 1080.0 {
            let w = wrap_180(angle);
            assert!(w > -180.0 && w <= 180.0, "{} wrapped to {}", angle, w);
            angle += 7.5;
        }
    }

    #[test]
    fn test_points() {
        assert_eq!(Point::from_heading(0.0), Point::N);
        assert_eq!(Point::from_heading(22.4), Point::N);
        assert_eq!(Point::from_heading(22.5), Point::NE);
        assert_eq!(Point::from_heading(90.0), Point::E);
        assert_eq!(Point::from_heading(135.0), Point::SE);
        assert_eq!(Point::from_heading(180.0), Point::S);
        assert_eq!(Point::from_heading(225.0), Point::SW);
        assert_eq!(Point::from_heading(270.0), Point::W);
        assert_eq!(Point::from_heading(315.0), Point::NW);
        assert_eq!(Point::from_heading(350.0), Point::N);
        assert_eq!(Point::from_heading(-10.0), Point::N);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Point::SW), "SW");
        assert_eq!(Point::NE.name(), "northeast");
    }
}
