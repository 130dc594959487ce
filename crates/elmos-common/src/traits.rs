use crate::types::StyledRun;

/// Display collaborator that receives decoded console output.
pub trait ConsoleSink: Send {
    /// Append a run to the end of the display.
    fn append(&mut self, run: StyledRun);

    /// Drop everything shown so far.
    fn clear(&mut self) {}
}

impl ConsoleSink for Vec<StyledRun> {
    fn append(&mut self, run: StyledRun) {
        self.push(run);
    }

    fn clear(&mut self) {
        Vec::clear(self);
    }
}

impl<S: ConsoleSink + ?Sized> ConsoleSink for Box<S> {
    fn append(&mut self, run: StyledRun) {
        (**self).append(run);
    }

    fn clear(&mut self) {
        (**self).clear();
    }
}
