/// What the chat endpoint's frame parser hands to the reconciler. Deltas are
/// already stripped down to the text payload; `Done` means the underlying
/// stream reported completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
}
