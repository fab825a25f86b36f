/// What a component did with a key event.
///
/// Components return this to their parent view so the view knows whether to
/// stop routing the key, react to an emitted event, or try the next handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing further to do
  Handled,
  /// Consumed, and the parent has an event to act on
  Event(T),
  /// Not consumed, route to the next handler
  NotHandled,
}
