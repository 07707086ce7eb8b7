// implemented by owners of channel subscriptions; the subscription closure holds an Rc back to
// its owner, so the cycle has to be broken by hand
pub trait Destroyable {
    fn destroy(&mut self);
}
