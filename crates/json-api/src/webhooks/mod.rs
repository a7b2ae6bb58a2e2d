//! Identity Provider Webhooks

mod identity;

pub(crate) use identity::*;
