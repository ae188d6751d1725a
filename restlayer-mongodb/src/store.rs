use async_trait::async_trait;
use bson::{Bson, Document, de::deserialize_from_bson, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOneOptions, FindOptions as MongoFindOptions},
};
use serde_json::{Map, Value};

use restlayer_core::{
    error::{RestError, RestResult},
    model::{Model, ModelBuilder, Record},
    query::{Expr, FieldSelector, FindOptions},
};

use crate::query::{MongoQueryTranslator, id_value, projection, to_bson};

fn backend(err: mongodb::error::Error) -> RestError {
    RestError::Backend(err.to_string())
}

/// Connects a MongoDB client from a connection string.
///
/// One client can back any number of [`MongoModel`]s.
///
/// # Errors
///
/// Returns [`RestError::Initialization`] when the connection string is invalid.
pub async fn connect(dsn: &str) -> RestResult<Client> {
    Client::with_options(
        ClientOptions::parse(dsn)
            .await
            .map_err(|e| RestError::Initialization(e.to_string()))?,
    )
    .map_err(|e| RestError::Initialization(e.to_string()))
}

/// A [`Model`] backed by one MongoDB collection.
///
/// Records are exchanged as JSON. Generated `ObjectId` identifiers are exposed as their
/// hex string, and identifiers in request paths that look like an `ObjectId` are
/// matched as one.
#[derive(Debug, Clone)]
pub struct MongoModel {
    collection: MongoCollection<Document>,
}

impl MongoModel {
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            collection: client.database(database).collection(collection),
        }
    }

    pub fn builder(dsn: &str, database: &str, collection: &str) -> MongoModelBuilder {
        MongoModelBuilder::new(dsn, database, collection)
    }

    /// Name of the underlying MongoDB collection.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Filter selecting the record addressed by a path identifier.
    ///
    /// Integer-looking identifiers also match records stored with a numeric `_id`.
    fn id_filter(id: &str) -> Document {
        match id.parse::<i64>() {
            Ok(number) => doc! { "_id": { "$in": [id, number] } },
            Err(_) => doc! { "_id": id_value(id) },
        }
    }
}

/// Converts a JSON object into a BSON document.
pub(crate) fn prepare_document(data: &Value) -> RestResult<Document> {
    match to_bson(data)? {
        Bson::Document(document) => Ok(document),
        _ => Err(RestError::InvalidDocument(
            "records must be JSON objects".to_string(),
        )),
    }
}

/// Converts a stored document back into a JSON record.
pub(crate) fn restore_document(mut document: Document) -> RestResult<Record> {
    if let Some(Bson::ObjectId(oid)) = document.get("_id") {
        let hex = oid.to_hex();
        document.insert("_id", hex);
    }

    deserialize_from_bson(Bson::Document(document))
        .map_err(|e| RestError::Serialization(e.to_string()))
}

#[async_trait]
impl Model for MongoModel {
    async fn find(
        &self,
        filter: &Expr,
        fields: Option<&FieldSelector>,
        options: FindOptions,
    ) -> RestResult<Vec<Record>> {
        let mut find_options = MongoFindOptions::default();

        find_options.limit = options.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
        if options.skip > 0 {
            find_options.skip = Some(options.skip as u64);
        }
        find_options.projection = fields.map(projection);

        self.collection
            .find(MongoQueryTranslator::translate(filter)?)
            .with_options(find_options)
            .await
            .map_err(backend)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend)?
            .into_iter()
            .map(restore_document)
            .collect()
    }

    async fn find_by_id(
        &self,
        id: &str,
        fields: Option<&FieldSelector>,
    ) -> RestResult<Option<Record>> {
        let mut options = FindOneOptions::default();
        options.projection = fields.map(projection);

        self.collection
            .find_one(Self::id_filter(id))
            .with_options(options)
            .await
            .map_err(backend)?
            .map(restore_document)
            .transpose()
    }

    async fn create(&self, data: Record) -> RestResult<Record> {
        let mut document = prepare_document(&data)?;

        if let Some(Bson::Null) = document.get("_id") {
            document.remove("_id");
        }

        let result = self
            .collection
            .insert_one(&document)
            .await
            .map_err(backend)?;

        if !document.contains_key("_id") {
            document.insert("_id", result.inserted_id);
        }

        tracing::debug!(collection = self.name(), "record inserted");

        restore_document(document)
    }

    async fn update(&self, id: &str, data: Map<String, Value>) -> RestResult<u64> {
        let set = prepare_document(&Value::Object(data))?;

        // MongoDB rejects an empty `$set`; report whether the record exists instead.
        if set.is_empty() {
            return self
                .collection
                .count_documents(Self::id_filter(id))
                .await
                .map_err(backend);
        }

        Ok(self
            .collection
            .update_one(Self::id_filter(id), doc! { "$set": set })
            .await
            .map_err(backend)?
            .matched_count)
    }

    async fn remove(&self, id: &str) -> RestResult<u64> {
        Ok(self
            .collection
            .delete_one(Self::id_filter(id))
            .await
            .map_err(backend)?
            .deleted_count)
    }
}

/// Builder for [`MongoModel`], connecting its own client unless one is supplied.
///
/// # Example
///
/// ```ignore
/// use restlayer_mongodb::MongoModel;
/// use restlayer_core::model::ModelBuilder;
///
/// let users = MongoModel::builder("mongodb://localhost:27017", "app", "users")
///     .build()
///     .await?;
/// ```
pub struct MongoModelBuilder {
    dsn: String,
    database: String,
    collection: String,
    client: Option<Client>,
}

impl MongoModelBuilder {
    pub fn new(dsn: &str, database: &str, collection: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            collection: collection.to_string(),
            client: None,
        }
    }

    /// Reuses an existing client instead of connecting a new one.
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }
}

#[async_trait]
impl ModelBuilder for MongoModelBuilder {
    type Model = MongoModel;

    async fn build(self) -> RestResult<Self::Model> {
        let client = match self.client {
            Some(client) => client,
            None => connect(&self.dsn).await?,
        };

        Ok(MongoModel::new(&client, &self.database, &self.collection))
    }
}
