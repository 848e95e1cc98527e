//! This module provides a client to connect to a Google-Calendar-flavoured REST service
//!
//! It implements [`CalendarService`] over plain HTTP + JSON, authenticated by a bearer
//! capability token obtained out-of-band (this crate owns no consent flow).

use std::error::Error;

use serde::Deserialize;
use url::Url;

use async_trait::async_trait;

use crate::calendar::{CalendarId, CalendarRef, TimeWindow};
use crate::event::{EventBody, SourceEvent};
use crate::service::{CalendarPage, CalendarService, EventPage, WriteStatus};

#[derive(Deserialize)]
struct WireCalendarPage {
    #[serde(default)]
    items: Vec<CalendarRef>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct WireEventPage {
    #[serde(default)]
    items: Vec<SourceEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct WireCreated {
    id: String,
}

/// A [`CalendarService`] that talks to a remote REST endpoint
pub struct Client {
    base_url: Url,
    token: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString>(base_url: S, token: T) -> Result<Self, Box<dyn Error>> {
        let mut base = base_url.as_ref().to_string();
        if base.ends_with('/') == false {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        Ok(Self {
            base_url,
            token: token.to_string(),
            http: reqwest::Client::new(),
        })
    }

    // TODO: percent-encode calendar and event ids that contain a '#'
    // (e.g. the public holiday calendars), they currently break the URL path
    fn endpoint(&self, path: &str) -> Result<Url, Box<dyn Error>> {
        let url = self.base_url.join(path)?;
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> Result<String, Box<dyn Error>> {
        let res = self.http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if res.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", res.status()).into());
        }
        let text = res.text().await?;
        Ok(text)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder, body: &impl serde::Serialize)
        -> Result<reqwest::Response, Box<dyn Error>>
    {
        let text = serde_json::to_string(body)?;
        let res = request
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(text)
            .send()
            .await?;
        Ok(res)
    }
}

#[async_trait]
impl CalendarService for Client {
    async fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarPage, Box<dyn Error>> {
        let mut url = self.endpoint("users/me/calendarList")?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }

        let text = self.get_text(url).await?;
        let page: WireCalendarPage = serde_json::from_str(&text)?;
        Ok(CalendarPage {
            items: page.items,
            next_page_token: page.next_page_token,
        })
    }

    async fn list_events(
        &self,
        calendar_id: &CalendarId,
        window: &TimeWindow,
        expand_recurring: bool,
        page_token: Option<&str>,
    ) -> Result<EventPage, Box<dyn Error>> {
        let mut url = self.endpoint(&format!("calendars/{}/events", calendar_id))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("timeMin", &window.start.to_rfc3339());
            query.append_pair("timeMax", &window.end.to_rfc3339());
            if expand_recurring {
                query.append_pair("singleEvents", "true");
            }
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }

        let text = self.get_text(url).await?;
        let page: WireEventPage = serde_json::from_str(&text)?;
        Ok(EventPage {
            items: page.items,
            next_page_token: page.next_page_token,
        })
    }

    async fn insert_event(&mut self, calendar_id: &CalendarId, body: &EventBody) -> Result<String, Box<dyn Error>> {
        let url = self.endpoint(&format!("calendars/{}/events", calendar_id))?;
        let res = self.send_json(self.http.post(url), body).await?;

        if res.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", res.status()).into());
        }
        let text = res.text().await?;
        let created: WireCreated = serde_json::from_str(&text)?;
        Ok(created.id)
    }

    async fn patch_event(
        &mut self,
        calendar_id: &CalendarId,
        event_id: &str,
        body: &EventBody,
    ) -> Result<WriteStatus, Box<dyn Error>> {
        let url = self.endpoint(&format!("calendars/{}/events/{}", calendar_id, event_id))?;
        let res = self.send_json(self.http.patch(url), body).await?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Ok(WriteStatus::Missing);
        }
        if status.is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", status).into());
        }
        Ok(WriteStatus::Done)
    }

    async fn remove_event(&mut self, calendar_id: &CalendarId, event_id: &str) -> Result<WriteStatus, Box<dyn Error>> {
        let url = self.endpoint(&format!("calendars/{}/events/{}", calendar_id, event_id))?;
        let res = self.http
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Ok(WriteStatus::Missing);
        }
        if status.is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", status).into());
        }
        Ok(WriteStatus::Done)
    }

    async fn find_or_create_calendar(&mut self, name: &str) -> Result<CalendarId, Box<dyn Error>> {
        // Walk the whole calendar list: the destination may be on any page
        let mut matches: Vec<CalendarId> = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_calendars(page_token.as_deref()).await?;
            for calendar in page.items {
                if calendar.name == name {
                    matches.push(calendar.id);
                }
            }
            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        match matches.len() {
            1 => return Ok(matches.into_iter().next().unwrap(/* there is exactly one */)),
            0 => (),
            _ => return Err(format!("Several calendars are named {:?}: refusing to pick one", name).into()),
        }

        let url = self.endpoint("calendars")?;
        let body = serde_json::json!({ "summary": name });
        let res = self.send_json(self.http.post(url), &body).await?;

        if res.status().is_success() == false {
            return Err(format!("Unexpected HTTP status code {:?}", res.status()).into());
        }
        let text = res.text().await?;
        let created: WireCreated = serde_json::from_str(&text)?;
        Ok(created.id)
    }
}
