//! Runtime identity of message types.
//!
//! The registries' registration surface is generic over the message type, but
//! resolution and dispatch work against erased values. A [`MessageToken`]
//! carries everything the erased side needs about one concrete message type:
//! its `TypeId`, its name, its kind, and the monomorphized glue the container
//! resolver uses to downcast instances for that type.
//!
//! Tokens are minted once per message type, on first use, into a
//! process-wide cache. The fast path takes a shared read lock; construction
//! is double-checked under the write lock so a concurrent first dispatch of
//! the same type never builds two tokens. Entries are never evicted -
//! bindings do not change after setup, so there is nothing to invalidate.

use std::any::{self, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;

use crate::message::{Message, MessageKind};
use crate::registry::container::{self, ContainerGlue};

/// Process-lifetime identity of one message type.
pub struct MessageToken {
    id: TypeId,
    name: &'static str,
    kind: MessageKind,
    pub(crate) container: ContainerGlue,
}

impl MessageToken {
    /// Get (or mint) the token for `M`.
    pub fn of<M: Message>() -> &'static MessageToken {
        let id = TypeId::of::<M>();
        {
            let cache = cache().read();
            if let Some(token) = cache.get(&id).copied() {
                return token;
            }
        }

        let mut cache = cache().write();
        // Another thread may have minted the token while we waited for the
        // write lock.
        if let Some(token) = cache.get(&id).copied() {
            return token;
        }
        let token: &'static MessageToken = Box::leak(Box::new(MessageToken {
            id,
            name: any::type_name::<M>(),
            kind: M::KIND,
            container: container::glue_for::<M>(),
        }));
        cache.insert(id, token);
        token
    }

    /// Look a token up by raw `TypeId`.
    ///
    /// Only types that have already passed through a typed dispatch or
    /// registration have a token; a bare `TypeId` carries too little to mint
    /// one.
    pub fn lookup(id: TypeId) -> Option<&'static MessageToken> {
        cache().read().get(&id).copied()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }
}

impl fmt::Debug for MessageToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageToken")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

fn cache() -> &'static RwLock<HashMap<TypeId, &'static MessageToken>> {
    static CACHE: OnceLock<RwLock<HashMap<TypeId, &'static MessageToken>>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}
