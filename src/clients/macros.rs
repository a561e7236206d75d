/// Generates `get_<entity>` (absent rows become `FarmError::NotFound`) and
/// `list_<entities>` for a client wrapping a `ResourceClient` in `inner`.
#[macro_export]
macro_rules! impl_client_methods {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident, $plural_snake:ident) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self))]
                pub async fn [<get_ $entity_name_snake>](
                    &self,
                    id: $crate::actor_framework::EntityId,
                ) -> $crate::error::FarmResult<$entity> {
                    tracing::debug!("Sending request");
                    self.inner.get(id).await?.ok_or_else(|| {
                        $crate::error::FarmError::not_found(
                            <$entity as $crate::actor_framework::Entity>::KIND,
                            id,
                        )
                    })
                }

                #[tracing::instrument(skip(self))]
                pub async fn [<list_ $plural_snake>](&self) -> $crate::error::FarmResult<Vec<$entity>> {
                    tracing::debug!("Sending request");
                    self.inner.all().await
                }
            }
        }
    };
}

/// Same as [`impl_client_methods`], but the generated reads take the calling
/// `Actor` and require one of `roles`.
#[macro_export]
macro_rules! impl_gated_client_methods {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident, $plural_snake:ident, roles = [$($role:expr),+ $(,)?]) => {
        paste::paste! {
            impl $client_name {
                #[tracing::instrument(skip(self, actor), fields(actor = actor.profile_id))]
                pub async fn [<get_ $entity_name_snake>](
                    &self,
                    actor: &$crate::domain::Actor,
                    id: $crate::actor_framework::EntityId,
                ) -> $crate::error::FarmResult<$entity> {
                    actor.require_any(&[$($role),+])?;
                    tracing::debug!("Sending request");
                    self.inner.get(id).await?.ok_or_else(|| {
                        $crate::error::FarmError::not_found(
                            <$entity as $crate::actor_framework::Entity>::KIND,
                            id,
                        )
                    })
                }

                #[tracing::instrument(skip(self, actor), fields(actor = actor.profile_id))]
                pub async fn [<list_ $plural_snake>](
                    &self,
                    actor: &$crate::domain::Actor,
                ) -> $crate::error::FarmResult<Vec<$entity>> {
                    actor.require_any(&[$($role),+])?;
                    tracing::debug!("Sending request");
                    self.inner.all().await
                }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_client_new {
    ($client_name:ident, $entity:ty) => {
        impl $client_name {
            pub fn new(inner: $crate::actor_framework::ResourceClient<$entity>) -> Self {
                Self { inner }
            }
        }
    };
}

#[macro_export]
macro_rules! impl_basic_client {
    ($client_name:ident, $entity:ty, $entity_name_snake:ident, $plural_snake:ident) => {
        impl_client_new!($client_name, $entity);
        impl_client_methods!($client_name, $entity, $entity_name_snake, $plural_snake);
    };
}
