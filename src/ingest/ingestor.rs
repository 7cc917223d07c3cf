use rusqlite::Connection;
use tracing::debug;

use crate::database::ids::ImageId;
use crate::database::resolver::{MatchType, Resolver};
use crate::error::Result;
use crate::ingest::document::{AnnotationDocument, WebImage};

/// Turns annotation documents into rows and edges, one document at a time.
pub struct DocumentIngestor<'c> {
    resolver: Resolver<'c>,
}

impl<'c> DocumentIngestor<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            resolver: Resolver::new(conn),
        }
    }

    /// Materialize one document and return the id of its subject image.
    ///
    /// Re-ingesting a document that is already stored creates no rows and
    /// returns the same id.
    pub fn ingest(&self, document: &AnnotationDocument) -> Result<ImageId> {
        let image = self.resolver.document_image(&document.url)?;
        let response = &document.response;

        for ann in &response.label_annotations {
            let label = self.resolver.label(&ann.mid, &ann.description)?;
            self.resolver.image_label(image, label, ann.score)?;
        }

        let web = &response.web_detection;
        self.ingest_matches(image, &web.full_matching_images, MatchType::Full)?;
        self.ingest_matches(image, &web.partial_matching_images, MatchType::Partial)?;

        for page in &web.pages_with_matching_images {
            let page_id = self.resolver.page(&page.url)?;
            self.resolver.image_page(image, page_id)?;
        }

        for ent in &web.web_entities {
            let entity = self.resolver.web_entity(&ent.entity_id, &ent.description)?;
            self.resolver.image_web_entity(image, entity, ent.score)?;
        }

        for lma in &response.landmark_annotations {
            let landmark = self.resolver.landmark(&lma.mid, &lma.description)?;
            self.resolver.image_landmark(image, landmark, lma.score)?;

            for loc in &lma.locations {
                let location = self
                    .resolver
                    .location(loc.lat_lng.latitude, loc.lat_lng.longitude)?;
                self.resolver.landmark_location(landmark, location)?;
            }
        }

        debug!(
            "Ingested {} as image {} ({} labels, {} web entities, {} landmarks)",
            document.url,
            image,
            response.label_annotations.len(),
            web.web_entities.len(),
            response.landmark_annotations.len()
        );
        Ok(image)
    }

    fn ingest_matches(&self, image: ImageId, matches: &[WebImage], kind: MatchType) -> Result<()> {
        for web_image in matches {
            let matched = self.resolver.image(&web_image.url)?;
            self.resolver.image_match(image, matched, kind)?;
        }
        Ok(())
    }
}
