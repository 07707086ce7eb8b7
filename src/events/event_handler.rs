/// Implemented by components that react to events delivered through a [`super::Channel`].
pub trait EventHandler<T> {
    fn handle_event(&mut self, event: &T);
}
