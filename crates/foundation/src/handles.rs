/// Generational handle: `(index, generation)`.
///
/// A handle only resolves while its generation matches the slot it points at,
/// so a handle kept past a release can never alias the slot's next occupant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u32, u32);

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}
