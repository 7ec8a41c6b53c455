/// Location is a stack-based pointer to the alert document
/// component currently being sanitized.
#[derive(Copy, Clone, Debug)]
pub enum Location<'a> {
    Root,
    Property(&'a Location<'a>, &'a str),
    Item(&'a Location<'a>, usize),
}

impl<'a> Location<'a> {
    /// Returns a new Location that extends this one with the given property.
    pub fn push_prop(&'a self, name: &'a str) -> Location<'a> {
        Location::Property(self, name)
    }

    /// Returns a new Location that extends this one with the given index.
    pub fn push_item(&'a self, index: usize) -> Location<'a> {
        Location::Item(self, index)
    }
}

impl std::fmt::Display for Location<'_> {
    /// Display the location as a JSON pointer.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Root => Ok(()),
            Location::Property(parent, name) => {
                write!(f, "{parent}/")?;
                for c in name.chars() {
                    match c {
                        '~' => f.write_str("~0")?,
                        '/' => f.write_str("~1")?,
                        c => write!(f, "{c}")?,
                    }
                }
                Ok(())
            }
            Location::Item(parent, index) => write!(f, "{parent}/{index}"),
        }
    }
}
