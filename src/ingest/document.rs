use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationDocument {
    pub url: String,
    pub response: AnnotateResponse,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    pub label_annotations: Vec<LabelAnnotation>,
    pub web_detection: WebDetection,
    #[serde(default)]
    pub landmark_annotations: Vec<LandmarkAnnotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelAnnotation {
    pub mid: String,
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDetection {
    #[serde(default)]
    pub full_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub partial_matching_images: Vec<WebImage>,
    #[serde(default)]
    pub pages_with_matching_images: Vec<WebPage>,
    pub web_entities: Vec<WebEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebImage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebPage {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebEntity {
    pub entity_id: String,
    #[serde(default)]
    pub description: String,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LandmarkAnnotation {
    pub mid: String,
    #[serde(default)]
    pub description: String,
    pub score: f64,
    pub locations: Vec<LocationInfo>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_default() {
        let doc: AnnotationDocument = serde_json::from_value(json!({
            "url": "img1",
            "response": {
                "labelAnnotations": [],
                "webDetection": {
                    "webEntities": [{"entityId": "/m/0abc", "score": 0.4}]
                },
                "landmarkAnnotations": [{
                    "mid": "/m/02nd_",
                    "score": 0.7,
                    "locations": [{"latLng": {"latitude": 40.7, "longitude": -74.0}}]
                }]
            }
        }))
        .unwrap();

        let web = &doc.response.web_detection;
        assert!(web.full_matching_images.is_empty());
        assert!(web.partial_matching_images.is_empty());
        assert!(web.pages_with_matching_images.is_empty());
        assert_eq!(web.web_entities[0].description, "");
        assert_eq!(doc.response.landmark_annotations[0].description, "");
        assert_eq!(doc.response.landmark_annotations[0].locations[0].lat_lng.longitude, -74.0);
    }

    #[test]
    fn test_missing_web_entities_is_rejected() {
        let result = serde_json::from_value::<AnnotationDocument>(json!({
            "url": "img1",
            "response": {"labelAnnotations": [], "webDetection": {}}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_label_requires_description() {
        let result = serde_json::from_value::<AnnotationDocument>(json!({
            "url": "img1",
            "response": {
                "labelAnnotations": [{"mid": "/m/015kr", "score": 0.9}],
                "webDetection": {"webEntities": []}
            }
        }));
        assert!(result.is_err());
    }
}
