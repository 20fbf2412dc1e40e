//! Logical channels and their resolution to broker destinations.
//!
//! A [`Channel`] is broker-agnostic: a name plus a kind. The broker
//! only sees [`Destination`] strings, built here by pure functions so
//! that the same (channel, subscriber) pair always lands on the same
//! destination across restarts.

use std::fmt;

/// Producer-side prefix for broadcast destinations.
pub(crate) const FANOUT_PREFIX: &str = "fanout.";
/// Consumer-side prefix for a subscriber group's copy of a fan-out stream.
pub(crate) const GROUP_PREFIX: &str = "group.";

/// How messages on a channel reach consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// One queue shared by every subscriber group; consumers compete.
    PointToPoint,
    /// Every subscriber group receives its own full copy of the stream.
    Broadcast,
}

/// A logical, named message stream.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Channel {
    pub name: String,
    pub kind: ChannelKind,
}

impl Channel {
    /// A point-to-point (competing consumers) channel.
    pub fn point_to_point(name: impl Into<String>) -> Self {
        Channel {
            name: name.into(),
            kind: ChannelKind::PointToPoint,
        }
    }

    /// A broadcast (fan-out per subscriber group) channel.
    pub fn broadcast(name: impl Into<String>) -> Self {
        Channel {
            name: name.into(),
            kind: ChannelKind::Broadcast,
        }
    }
}

/// A concrete broker-level destination name.
///
/// Point-to-point channels resolve to the bare channel name on both
/// sides. Broadcast channels resolve to `fanout.{channel}` for the
/// producer and `group.{subscriber}.fanout.{channel}` for each
/// consumer, so every subscriber group gets its own durable copy of
/// the fan-out stream and resumes it after a restart.
///
/// ## Example
///
/// ```
/// use consumed_rust::{Channel, Destination};
///
/// let orders = Channel::point_to_point("orders");
/// assert_eq!(Destination::for_consumer(&orders, "billing").as_str(), "orders");
///
/// let prices = Channel::broadcast("prices");
/// assert_eq!(Destination::for_producer(&prices).as_str(), "fanout.prices");
/// assert_eq!(
///     Destination::for_consumer(&prices, "billing").as_str(),
///     "group.billing.fanout.prices",
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination(String);

impl Destination {
    /// Wrap an already-resolved destination name.
    pub fn raw(name: impl Into<String>) -> Self {
        Destination(name.into())
    }

    /// The destination a producer sends a channel's messages to.
    pub fn for_producer(channel: &Channel) -> Self {
        match channel.kind {
            ChannelKind::PointToPoint => Destination(channel.name.clone()),
            ChannelKind::Broadcast => Destination(format!("{}{}", FANOUT_PREFIX, channel.name)),
        }
    }

    /// The destination a subscriber group consumes a channel from.
    pub fn for_consumer(channel: &Channel, subscriber_id: &str) -> Self {
        match channel.kind {
            ChannelKind::PointToPoint => Destination(channel.name.clone()),
            ChannelKind::Broadcast => Destination(format!(
                "{}{}.{}{}",
                GROUP_PREFIX, subscriber_id, FANOUT_PREFIX, channel.name
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_to_point_ignores_subscriber() {
        let channel = Channel::point_to_point("orders");
        let a = Destination::for_consumer(&channel, "sub0");
        let b = Destination::for_consumer(&channel, "sub1");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "orders");
        assert_eq!(Destination::for_producer(&channel).as_str(), "orders");
    }

    #[test]
    fn broadcast_embeds_subscriber_and_is_stable() {
        let channel = Channel::broadcast("prices");
        let first = Destination::for_consumer(&channel, "audit");
        let again = Destination::for_consumer(&channel, "audit");
        assert_eq!(first, again);
        assert_eq!(first.as_str(), "group.audit.fanout.prices");
    }

    #[test]
    fn broadcast_groups_do_not_collide() {
        let channel = Channel::broadcast("prices");
        let a = Destination::for_consumer(&channel, "sub0");
        let b = Destination::for_consumer(&channel, "sub1");
        assert_ne!(a, b);
    }

    #[test]
    fn kinds_do_not_collide_on_same_name() {
        let queue = Channel::point_to_point("events");
        let topic = Channel::broadcast("events");
        assert_ne!(
            Destination::for_producer(&queue),
            Destination::for_producer(&topic)
        );
        assert_ne!(
            Destination::for_consumer(&queue, "s"),
            Destination::for_consumer(&topic, "s")
        );
    }
}
